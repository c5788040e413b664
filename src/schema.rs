// Evergreen schema - Life tracking tables for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

diesel::table! {
    habits (id) {
        id -> Integer,
        change_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        predicate -> Text,
        required_count -> Integer,
        target_count -> Integer,
        goal_id -> Nullable<Integer>,
        created_at -> Text,
        updated_at -> Text,
        archived_at -> Nullable<Text>,
    }
}

diesel::table! {
    habit_entries (id) {
        id -> Integer,
        habit_id -> Integer,
        entry_date -> Text,
        completed_count -> Integer,
        note -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    goals (id) {
        id -> Integer,
        change_id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        year -> Integer,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    contacts (id) {
        id -> Integer,
        change_id -> Text,
        name -> Text,
        circle -> Nullable<Text>,
        cadence_days -> Nullable<Integer>,
        notes -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    interactions (id) {
        id -> Integer,
        contact_id -> Integer,
        occurred_on -> Text,
        channel -> Nullable<Text>,
        note -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    captures (id) {
        id -> Integer,
        change_id -> Text,
        content -> Text,
        content_hash -> Text,
        category -> Nullable<Text>,
        classified_at -> Nullable<Text>,
        captured_at -> Text,
    }
}

diesel::table! {
    milestone_events (id) {
        id -> Integer,
        habit_id -> Integer,
        threshold -> Integer,
        reached_on -> Text,
        created_at -> Text,
    }
}


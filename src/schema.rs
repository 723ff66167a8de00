//! Diesel declarations for the tables created by `migrations/`.
//!
//! `area_stats` is a view; it is declared as a table keyed by the area id so it
//! can be queried with the regular DSL. Never insert into it.

diesel::table! {
    areas (id) {
        id -> Int4,
        slug -> Text,
        name -> Text,
        image -> Nullable<Text>,
        starting_price -> Nullable<Text>,
        project_count -> Int4,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    developers (id) {
        id -> Int4,
        slug -> Text,
        name -> Text,
        description -> Nullable<Text>,
        logo -> Nullable<Text>,
        website -> Nullable<Text>,
        founded_year -> Nullable<Int4>,
        headquarters -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> Int4,
        name -> Text,
        slug -> Text,
        location -> Nullable<Text>,
        price_from -> Nullable<Text>,
        developer_id -> Nullable<Int4>,
        area_id -> Nullable<Int4>,
        unit_types -> Nullable<Jsonb>,
        amenities -> Array<Text>,
        completion_date -> Nullable<Text>,
        image -> Nullable<Text>,
        match_score -> Nullable<Float8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Int4,
        name -> Nullable<Text>,
        phone -> Nullable<Text>,
        email -> Nullable<Text>,
        budget -> Nullable<Text>,
        interested_project -> Nullable<Text>,
        preferred_area -> Nullable<Text>,
        bedrooms -> Nullable<Text>,
        timeline -> Nullable<Text>,
        investment_purpose -> Nullable<Text>,
        notes -> Nullable<Text>,
        source -> Text,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    area_market_stats (id) {
        id -> Int4,
        area_name -> Text,
        area_slug -> Nullable<Text>,
        avg_price_per_sqft -> Nullable<Float8>,
        median_price -> Nullable<Float8>,
        transaction_count -> Int4,
        total_volume -> Nullable<Float8>,
        price_change_yoy -> Nullable<Float8>,
        rental_yield -> Nullable<Float8>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    market_trends (id) {
        id -> Int4,
        month -> Date,
        avg_price_per_sqft -> Nullable<Float8>,
        transaction_count -> Int4,
        total_volume -> Nullable<Float8>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    area_monthly_stats (id) {
        id -> Int4,
        area_name -> Text,
        month -> Date,
        avg_price_per_sqft -> Nullable<Float8>,
        transaction_count -> Int4,
        created_at -> Timestamptz,
    }
}

// View: areas LEFT JOIN projects, grouped by area.
diesel::table! {
    area_stats (id) {
        id -> Int4,
        slug -> Text,
        name -> Text,
        image -> Nullable<Text>,
        starting_price -> Nullable<Text>,
        description -> Nullable<Text>,
        actual_project_count -> Int8,
        min_price -> Nullable<Int8>,
    }
}

diesel::joinable!(projects -> developers (developer_id));
diesel::joinable!(projects -> areas (area_id));

diesel::allow_tables_to_appear_in_same_query!(
    areas,
    developers,
    projects,
    leads,
    area_market_stats,
    market_trends,
    area_monthly_stats,
    area_stats,
);

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        password_hash -> Text,
        stripe_customer_id -> Nullable<Text>,
        stripe_subscription_id -> Nullable<Text>,
        subscription_status -> Text,
        subscription_end_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    establishments (id) {
        id -> Uuid,
        name -> Text,
        slug -> Text,
        alert_email -> Text,
        user_id -> Uuid,
        google_review_url -> Nullable<Text>,
        show_google_review_prompt -> Bool,
        created_at -> Timestamptz,
        weekly_reports_enabled -> Bool,
    }
}

diesel::table! {
    feedbacks (id) {
        id -> Uuid,
        rating -> Text,
        comment -> Nullable<Text>,
        establishment_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(establishments -> users (user_id));
diesel::joinable!(feedbacks -> establishments (establishment_id));

diesel::allow_tables_to_appear_in_same_query!(users, establishments, feedbacks);

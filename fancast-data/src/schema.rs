#![allow(warnings)]

diesel::table! {
    episodes (id) {
        id -> Text,
        parent -> Text,
        guid -> Nullable<Text>,
        title -> Text,
        description -> Nullable<Text>,
        link -> Nullable<Text>,
        published -> Nullable<Text>,
        published_parsed -> Nullable<Timestamp>,
        author -> Nullable<Text>,
        image -> Nullable<Text>,
        enclosures -> Nullable<Text>,
        itunes_ext -> Nullable<Text>,
        digest -> Text,
        last_fetch -> Timestamp,
    }
}

diesel::table! {
    podcasts (id) {
        id -> Text,
        feed_url -> Text,
        title -> Text,
        description -> Text,
        link -> Text,
        updated -> Nullable<Text>,
        author -> Nullable<Text>,
        language -> Nullable<Text>,
        image -> Nullable<Text>,
        itunes_ext -> Nullable<Text>,
        categories -> Nullable<Text>,
        copyright -> Nullable<Text>,
        digest -> Text,
        last_fetch -> Timestamp,
        last_change -> Nullable<Timestamp>,
        poll_frequency -> Integer,
        response_headers -> Nullable<Text>,
    }
}

diesel::joinable!(episodes -> podcasts (parent));

diesel::allow_tables_to_appear_in_same_query!(episodes, podcasts);

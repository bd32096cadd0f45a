pub mod graphql_id;

use std::collections::HashMap;

use stripe::{Client, CreateCustomer, Customer};

use crate::error::{AppError, Res};

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

/// Creates a Stripe customer tagged with the identity provider user id.
pub async fn create_customer(
    client: &Client,
    user_id: &str,
    email: Option<&str>,
    name: Option<&str>,
) -> Res<Customer> {
    let params = CreateCustomer {
        email,
        name,
        metadata: Some(HashMap::from([("user_id".to_string(), user_id.to_string())])),
        ..Default::default()
    };

    Customer::create(client, params)
        .await
        .map_err(AppError::from)
}

//! Administrative endpoints: roles, users and the tenant record
//!
//! Same executor and unwrapping rules as collections, against fixed paths.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::collection::{decode, encode, encode_segment};
use crate::error::Result;
use crate::http::request::{RequestOptions, TransportMode};
use crate::http::response::{unwrap_list, unwrap_one, unwrap_written};
use crate::http::RequestExecutor;

pub const ROLES_PATH: &str = "/v1/admin/roles";
pub const USERS_PATH: &str = "/v1/admin/users";
pub const TENANT_PATH: &str = "/v1/admin/tenant";

/// Admin sub-namespace of a [`crate::Client`]
#[derive(Debug, Clone)]
pub struct AdminApi {
    executor: Arc<RequestExecutor>,
}

impl AdminApi {
    pub(crate) fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn list_roles<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.fetch_list(ROLES_PATH).await
    }

    pub async fn create_role<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        role: &P,
    ) -> Result<Option<T>> {
        self.write(ROLES_PATH, RequestOptions::post(encode(role)?)).await
    }

    pub async fn update_role<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        id: impl fmt::Display,
        changes: &P,
    ) -> Result<Option<T>> {
        let path = item_path(ROLES_PATH, id);
        self.write(&path, RequestOptions::patch(encode(changes)?)).await
    }

    pub async fn delete_role(&self, id: impl fmt::Display) -> Result<()> {
        self.executor
            .execute(&item_path(ROLES_PATH, id), RequestOptions::delete())
            .await?;
        Ok(())
    }

    pub async fn list_users<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.fetch_list(USERS_PATH).await
    }

    /// A user that does not exist is `None`
    pub async fn get_user<T: DeserializeOwned>(&self, id: impl fmt::Display) -> Result<Option<T>> {
        match self
            .executor
            .execute(&item_path(USERS_PATH, id), RequestOptions::get())
            .await
        {
            Ok(body) => unwrap_one(&body, self.is_proxy()).map(decode).transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn update_user<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        id: impl fmt::Display,
        changes: &P,
    ) -> Result<Option<T>> {
        let path = item_path(USERS_PATH, id);
        self.write(&path, RequestOptions::patch(encode(changes)?)).await
    }

    /// Remove a user from the tenant
    pub async fn remove_user(&self, id: impl fmt::Display) -> Result<()> {
        self.executor
            .execute(&item_path(USERS_PATH, id), RequestOptions::delete())
            .await?;
        Ok(())
    }

    pub async fn get_tenant<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.executor.execute(TENANT_PATH, RequestOptions::get()).await?;
        decode(unwrap_one(&body, self.is_proxy()).unwrap_or(Value::Null))
    }

    pub async fn update_tenant<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        changes: &P,
    ) -> Result<Option<T>> {
        self.write(TENANT_PATH, RequestOptions::patch(encode(changes)?)).await
    }

    fn is_proxy(&self) -> bool {
        self.executor.mode() == TransportMode::Proxy
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let body = self.executor.execute(path, RequestOptions::get()).await?;
        unwrap_list(&body, self.is_proxy())
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Writes that come back without a body resolve to `None`
    async fn write<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<Option<T>> {
        let body = self.executor.execute(path, options).await?;
        unwrap_written(&body, self.is_proxy()).map(decode).transpose()
    }
}

fn item_path(base: &str, id: impl fmt::Display) -> String {
    format!("{}/{}", base, encode_segment(&id.to_string()))
}

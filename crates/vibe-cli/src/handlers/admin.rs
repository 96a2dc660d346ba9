//! Admin command handlers: roles, users and the tenant record

use super::read_payload;
use crate::cli::{AdminArgs, AdminResource, RoleAction, TenantAction, UserAction};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, TableLimits};
use serde_json::{json, Value};
use vibe_core::{AdminApi, Client, ErrorKind};

/// Handle the admin command
pub async fn handle_admin(
    args: AdminArgs,
    client: &Client,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let admin = client.admin();

    match args.resource {
        AdminResource::Roles { action } => handle_roles(action, &admin, limits, output).await,
        AdminResource::Users { action } => handle_users(action, &admin, limits, output).await,
        AdminResource::Tenant { action } => handle_tenant(action, &admin, limits, output).await,
    }
}

async fn handle_roles(
    action: RoleAction,
    admin: &AdminApi,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("admin", "roles");

    match action {
        RoleAction::List => {
            let roles: Vec<Value> = admin.list_roles().await?;
            output.records(&roles, None, limits)
        }
        RoleAction::Create { data } => {
            let role: Option<Value> = admin.create_role(&read_payload(&data)?).await?;
            output.success("✓ Created role")?;
            output.written(role.as_ref(), limits)
        }
        RoleAction::Update { id, data } => {
            let role: Option<Value> = admin.update_role(&id, &read_payload(&data)?).await?;
            output.success(&format!("✓ Updated role {}", id))?;
            output.written(role.as_ref(), limits)
        }
        RoleAction::Delete { id } => {
            admin.delete_role(&id).await?;
            removed(output, "role", &id, &format!("✓ Deleted role {}", id))
        }
    }
}

async fn handle_users(
    action: UserAction,
    admin: &AdminApi,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("admin", "users");

    match action {
        UserAction::List => {
            let users: Vec<Value> = admin.list_users().await?;
            output.records(&users, None, limits)
        }
        UserAction::Get { id } => match admin.get_user::<Value>(&id).await? {
            Some(user) => output.record(&user, limits),
            None => {
                let message = format!("No user '{}'", id);
                output.warning(&message)?;
                Err(Error::Api(vibe_core::Error::new(ErrorKind::NotFound, message)))
            }
        },
        UserAction::Update { id, data } => {
            let user: Option<Value> = admin.update_user(&id, &read_payload(&data)?).await?;
            output.success(&format!("✓ Updated user {}", id))?;
            output.written(user.as_ref(), limits)
        }
        UserAction::Remove { id } => {
            admin.remove_user(&id).await?;
            removed(output, "user", &id, &format!("✓ Removed user {} from the tenant", id))
        }
    }
}

async fn handle_tenant(
    action: TenantAction,
    admin: &AdminApi,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("admin", "tenant");

    match action {
        TenantAction::Show => {
            let tenant: Value = admin.get_tenant().await?;
            output.record(&tenant, limits)
        }
        TenantAction::Update { data } => {
            let tenant: Option<Value> = admin.update_tenant(&read_payload(&data)?).await?;
            output.success("✓ Updated tenant")?;
            output.written(tenant.as_ref(), limits)
        }
    }
}

/// Confirm a deletion in the selected output format
fn removed(output: &mut OutputWriter, resource: &str, id: &str, message: &str) -> Result<()> {
    if output.is_human() {
        output.success(message)
    } else {
        output.data(&json!({"deleted": true, "resource": resource, "id": id}))
    }
}

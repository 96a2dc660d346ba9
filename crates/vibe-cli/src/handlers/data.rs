//! Collection record command handlers

use super::{parse_filter, read_payload, with_retries};
use crate::cli::{CreateArgs, DeleteArgs, GetArgs, ListArgs, UpdateArgs};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, TableLimits};
use serde_json::{json, Value};
use vibe_core::{Client, ErrorKind, ListQuery};

/// Build the list query from command-line arguments
pub(crate) fn build_query(args: &ListArgs) -> Result<ListQuery> {
    let mut query = ListQuery::new().limit(args.limit).offset(args.offset);

    if let Some(field) = &args.order_by {
        query = query.order_by(field.as_str(), args.order_dir.map(Into::into));
    }
    for filter in &args.filters {
        let (field, value) = parse_filter(filter)?;
        query = query.filter(field, value);
    }

    Ok(query)
}

/// Handle the list command
pub async fn handle_list(
    args: ListArgs,
    client: &Client,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("list", &args.collection);
    let query = build_query(&args)?;
    let collection = client.collection(&args.collection);

    let spinner = output.spinner(&format!("Fetching {}...", args.collection));
    let result = with_retries(args.retry, || collection.list::<Value>(&query)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let page = result?;

    tracing::info!(
        collection = %args.collection,
        returned = page.data.len(),
        total = page.pagination.total,
        "Listed records"
    );
    output.records(&page.data, Some(&page.pagination), limits)
}

/// Handle the get command
pub async fn handle_get(
    args: GetArgs,
    client: &Client,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("get", &args.collection);
    let collection = client.collection(&args.collection);

    let record = with_retries(args.retry, || collection.get::<Value>(&args.id)).await?;

    match record {
        Some(record) => output.record(&record, limits),
        None => {
            let message = format!("No record '{}' in {}", args.id, args.collection);
            output.warning(&message)?;
            Err(Error::Api(vibe_core::Error::new(ErrorKind::NotFound, message)))
        }
    }
}

/// Handle the create command
pub async fn handle_create(
    args: CreateArgs,
    client: &Client,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("create", &args.collection);
    let payload = read_payload(&args.data)?;
    let collection = client.collection(&args.collection);

    let created = with_retries(args.retry, || collection.create::<Value, _>(&payload)).await?;

    output.success(&format!("✓ Created record in {}", args.collection))?;
    output.written(created.as_ref(), limits)
}

/// Handle the update command
pub async fn handle_update(
    args: UpdateArgs,
    client: &Client,
    limits: TableLimits,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("update", &args.collection);
    let changes = read_payload(&args.data)?;
    let collection = client.collection(&args.collection);

    let updated = with_retries(args.retry, || collection.update::<Value, _>(&args.id, &changes)).await?;

    output.success(&format!("✓ Updated {}/{}", args.collection, args.id))?;
    output.written(updated.as_ref(), limits)
}

/// Handle the delete command
pub async fn handle_delete(args: DeleteArgs, client: &Client, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("delete", &args.collection);
    let collection = client.collection(&args.collection);

    with_retries(args.retry, || collection.delete(&args.id)).await?;

    if output.is_human() {
        output.success(&format!("✓ Deleted {}/{}", args.collection, args.id))
    } else {
        output.data(&json!({
            "deleted": true,
            "collection": args.collection,
            "id": args.id,
        }))
    }
}

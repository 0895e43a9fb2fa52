//! Read and heart commands. Each prints its result as pretty JSON.

use serde::Serialize;
use tracing::warn;

use storefinder_core::{GeoPoint, HeartState, StoreId, UserId};
use storefinder_data::models::Populate;
use storefinder_data::{Directory, DirectoryError};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print `value` to stdout as pretty JSON.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

pub async fn tags(directory: &Directory) -> CommandResult {
    print_json(&directory.stores().tags().await?)?;
    Ok(())
}

pub async fn top(directory: &Directory) -> CommandResult {
    print_json(&directory.stores().top_stores().await?)?;
    Ok(())
}

pub async fn store(directory: &Directory, slug: &str, reviews: bool, author: bool) -> CommandResult {
    let detail = directory
        .stores()
        .store_by_slug(slug, Populate { author, reviews })
        .await?
        .ok_or_else(|| format!("No store found for slug {slug:?}"))?;

    print_json(&detail)?;
    Ok(())
}

/// Print a page of stores. A page past the end falls back to the last page.
pub async fn list(directory: &Directory, page: u32) -> CommandResult {
    let stores = directory.stores();
    let listing = match stores.list_stores(page).await {
        Err(DirectoryError::PageOutOfRange { last_page }) => {
            warn!(page, last_page, "Page does not exist, showing the last page");
            stores.list_stores(last_page).await?
        }
        other => other?,
    };

    print_json(&listing)?;
    Ok(())
}

pub async fn search(directory: &Directory, query: &str) -> CommandResult {
    print_json(&directory.stores().search_stores(query).await?)?;
    Ok(())
}

pub async fn near(directory: &Directory, lng: f64, lat: f64) -> CommandResult {
    let origin = GeoPoint::new(lng, lat)?;
    print_json(&directory.stores().stores_near(origin).await?)?;
    Ok(())
}

#[derive(Serialize)]
struct HeartOutput {
    store: StoreId,
    state: HeartState,
    hearts: Vec<StoreId>,
}

pub async fn heart(directory: &Directory, user: UserId, store: StoreId) -> CommandResult {
    let (user, state) = directory.users().toggle_heart(user, store).await?;

    print_json(&HeartOutput {
        store,
        state,
        hearts: user.hearts.iter().collect(),
    })?;
    Ok(())
}

pub async fn hearts(directory: &Directory, user: UserId) -> CommandResult {
    print_json(&directory.stores().hearted_stores(user).await?)?;
    Ok(())
}

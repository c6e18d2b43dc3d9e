//! User commands - thin wrappers over the `UserStore` operations.

use userstore::{MembershipOp, UserStore};

use super::parse_document;
use crate::cli::UpdateArgs;
use crate::output::{OutputFormat, print_count, print_user};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Run the add command
pub async fn add(store: &UserStore, user: &str, format: OutputFormat) -> CmdResult {
    let stored = store.add(parse_document(user)?).await?;
    print_user(Some(&stored), format)
}

/// Run the get command
pub async fn get(store: &UserStore, filter: &str, format: OutputFormat) -> CmdResult {
    let user = store.get(&parse_document(filter)?).await?;
    print_user(user.as_ref(), format)
}

/// Run the update command
pub async fn update(store: &UserStore, args: &UpdateArgs, format: OutputFormat) -> CmdResult {
    let filter = parse_document(&args.filter)?;
    let updates = parse_document(&args.updates)?;

    let membership = if !args.add.is_empty() {
        Some(MembershipOp::add(args.add.iter().cloned()))
    } else if !args.remove.is_empty() {
        Some(MembershipOp::remove(args.remove.iter().cloned()))
    } else {
        None
    };

    match (membership, args.get) {
        (None, false) => print_count("updated", store.update(&filter, updates).await?, format),
        (None, true) => print_user(store.update_get(&filter, updates).await?.as_ref(), format),
        (Some(op), false) => print_count(
            "updated",
            store.update_atomic(&filter, updates, op).await?,
            format,
        ),
        (Some(op), true) => print_user(
            store
                .update_get_atomic(&filter, updates, op)
                .await?
                .as_ref(),
            format,
        ),
    }
}

/// Run the remove command
pub async fn remove(store: &UserStore, filter: &str, format: OutputFormat) -> CmdResult {
    let removed = store.remove(&parse_document(filter)?).await?;
    print_count("removed", removed, format)
}

/// Run the count command
pub async fn count(store: &UserStore, filter: &str, format: OutputFormat) -> CmdResult {
    let count = store.count(&parse_document(filter)?).await?;
    print_count("counted", count, format)
}

/// Run the add-membership and remove-membership commands
pub async fn membership(
    store: &UserStore,
    filter: &str,
    op: MembershipOp,
    format: OutputFormat,
) -> CmdResult {
    let filter = parse_document(filter)?;
    let updated = match op {
        MembershipOp::Add(memberships) => store.add_membership(&filter, memberships).await?,
        MembershipOp::Remove(memberships) => store.remove_membership(&filter, memberships).await?,
    };
    print_count("updated", updated, format)
}

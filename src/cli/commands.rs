//! Executes parsed commands: one repository call per command, results printed as JSON.

use crate::cli::{Collection, Command, UserAction};
use crate::config::Settings;
use crate::core::{AdminData, Repository, notification, seed, user};
use crate::errors::{Error, Result};
use crate::models::{Entity, Fields, Record};
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::{error, info};

/// Runs `$body` with `$repo` bound to the repository for `$collection`.
macro_rules! with_repository {
    ($data:expr, $collection:expr, |$repo:ident| $body:expr) => {
        match $collection {
            Collection::Products => {
                let $repo = &$data.products;
                $body
            }
            Collection::Categories => {
                let $repo = &$data.categories;
                $body
            }
            Collection::Brands => {
                let $repo = &$data.brands;
                $body
            }
            Collection::Users => {
                let $repo = &$data.users;
                $body
            }
            Collection::Orders => {
                let $repo = &$data.orders;
                $body
            }
            Collection::Notifications => {
                let $repo = &$data.notifications;
                $body
            }
            Collection::Banners => {
                let $repo = &$data.banners;
                $body
            }
        }
    };
}

/// Executes `command`.
///
/// # Errors
/// Returns whatever the underlying repository call returns, or an I/O error
/// if printing or prompting fails.
pub async fn run(command: Command, data: &AdminData, settings: &Settings) -> Result<()> {
    match command {
        Command::List { collection } => with_repository!(data, collection, |repo| {
            print_json(&repo.list().await?)
        }),
        Command::Get { collection, id } => with_repository!(data, collection, |repo| {
            print_json(&repo.get(&id).await?)
        }),
        Command::Add { collection, fields } => {
            let fields = fields.into_fields()?;
            with_repository!(data, collection, |repo| add(repo, fields).await)
        }
        Command::Edit {
            collection,
            id,
            fields,
        } => {
            let fields = fields.into_fields()?;
            with_repository!(data, collection, |repo| edit(repo, &id, fields).await)
        }
        Command::Delete {
            collection,
            id,
            yes,
        } => with_repository!(data, collection, |repo| delete(repo, &id, yes).await),
        Command::User {
            action: UserAction::Toggle { id },
        } => {
            let status = user::toggle_status(&data.users, &id).await?;
            println!("User {id} is now {status}");
            Ok(())
        }
        Command::Notify { title, body } => {
            let id = notification::send(&data.notifications, &title, &body).await?;
            println!("{id}");
            Ok(())
        }
        Command::Notifications => {
            print_json(&notification::list_newest_first(&data.notifications).await?)
        }
        Command::Watch { collection } => {
            with_repository!(data, collection, |repo| watch(repo).await)
        }
        Command::Seed => {
            let created = seed::seed_categories(&data.categories, &settings.categories).await?;
            println!("Created {created} categories");
            Ok(())
        }
    }
}

async fn add<T: Entity>(repo: &Repository<T>, fields: Fields) -> Result<()> {
    let id = repo.create(fields).await?;
    println!("{id}");
    Ok(())
}

async fn edit<T: Entity>(repo: &Repository<T>, id: &str, patch: Fields) -> Result<()> {
    repo.update(id, patch).await?;
    println!("Updated {id}");
    Ok(())
}

async fn delete<T: Entity>(repo: &Repository<T>, id: &str, yes: bool) -> Result<()> {
    if !yes {
        let prompt = format!("Delete {}/{id}? This cannot be undone. [y/N] ", repo.collection());
        if !confirm(&prompt, &mut std::io::stdin().lock(), &mut std::io::stderr())? {
            println!("Cancelled");
            return Ok(());
        }
    }
    repo.remove(id).await?;
    println!("Deleted {id}");
    Ok(())
}

async fn watch<T: Entity>(repo: &Repository<T>) -> Result<()> {
    watch_until(repo, tokio::signal::ctrl_c()).await
}

/// Prints every snapshot until `stop` resolves or the change feed ends.
async fn watch_until<T, F>(repo: &Repository<T>, stop: F) -> Result<()>
where
    T: Entity,
    F: Future<Output = std::io::Result<()>>,
{
    let mut subscription = repo
        .subscribe(|records: Vec<Record<T>>| {
            if let Err(e) = print_json(&records) {
                error!("Failed to print snapshot: {}", e);
            }
        })
        .await?;
    info!("Watching {}; press Ctrl-C to stop", repo.collection());

    let feed_ended = tokio::select! {
        stopped = stop => {
            stopped?;
            false
        }
        () = subscription.closed() => true,
    };
    if feed_ended {
        return Err(Error::service(format!(
            "change feed for '{}' ended",
            repo.collection()
        )));
    }
    subscription.unsubscribe();
    Ok(())
}

/// Asks a yes/no question; anything but `y`/`yes` means no.
fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn print_json<S: Serialize>(value: &S) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

//! Two-context simulation: a background aggregator task that only sees the
//! store's change stream, and a foreground editor reading commands from
//! stdin.

use std::path::Path;
use std::rc::Rc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use cw_core::background::{BackgroundEvent, BadgeAggregator};
use cw_core::lists::{ListField, ListKey, ListKind};
use cw_core::store::{edit_list, load_lists, TermEdit};
use cw_core::types::StorageChange;

use crate::fixture::{read_cookies, FileStore, FixturePlatform, FIXTURE_TAB};

pub struct WatchOptions {
    pub store: String,
    pub cookies: String,
    pub url: String,
}

/// A line of foreground input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(ListKey, TermEdit),
    Show,
    Quit,
}

pub fn parse_list_key(list: &str, field: &str) -> Result<ListKey, String> {
    let kind = match list {
        "blacklist" | "black" => ListKind::Blacklist,
        "greylist" | "grey" | "graylist" | "gray" => ListKind::Greylist,
        other => return Err(format!("Unknown list '{}' (expected blacklist or greylist)", other)),
    };
    let field = match field {
        "names" | "name" => ListField::Names,
        "values" | "value" => ListField::Values,
        other => return Err(format!("Unknown field '{}' (expected names or values)", other)),
    };
    Ok(ListKey::new(kind, field))
}

/// Parse `add <list> <field> <term>`, `remove <list> <field> <term>`,
/// `show` or `quit`. The term is the rest of the line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let mut parts = line.splitn(4, char::is_whitespace);
    match parts.next().unwrap_or("") {
        "show" => Ok(Command::Show),
        "quit" | "exit" => Ok(Command::Quit),
        verb @ ("add" | "remove") => {
            let (Some(list), Some(field), Some(term)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(format!("usage: {} <list> <field> <term>", verb));
            };
            let key = parse_list_key(list, field)?;
            let term = term.trim().to_string();
            Ok(Command::Edit(
                key,
                if verb == "add" { TermEdit::Add(term) } else { TermEdit::Remove(term) },
            ))
        }
        other => Err(format!("Unknown command '{}'", other)),
    }
}

fn report(platform: &FixturePlatform) {
    match platform.badge(FIXTURE_TAB) {
        Some((text, color)) if !text.is_empty() => {
            println!("[background] Badge: {} ({})", text, color.as_deref().unwrap_or("-"))
        }
        _ => println!("[background] Badge: (cleared)"),
    }
}

async fn background_task(
    aggregator: Rc<BadgeAggregator<FixturePlatform>>,
    mut changes: broadcast::Receiver<StorageChange>,
) {
    if aggregator.handle_event(&BackgroundEvent::Installed).await.is_some() {
        report(aggregator.platform());
    }

    loop {
        match changes.recv().await {
            Ok(change) => {
                let event = BackgroundEvent::StorageChanged(change);
                if aggregator.handle_event(&event).await.is_some() {
                    report(aggregator.platform());
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("background skipped {} change notifications", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub fn run_watch(opts: WatchOptions) -> Result<(), String> {
    let cookies = read_cookies(Path::new(&opts.cookies))?;
    let (tx, rx) = broadcast::channel(16);

    // Background only reads; it holds no sender so the stream closes when
    // the foreground goes away.
    let background = Rc::new(BadgeAggregator::new(FixturePlatform::new(
        FileStore::new(&opts.store),
        Some(opts.url.clone()),
        cookies,
    )));
    let foreground = FileStore::new(&opts.store).with_changes(tx);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&rt, async move {
        let handle = tokio::task::spawn_local(background_task(background, rx));
        tokio::task::yield_now().await;

        println!("Commands: add|remove <blacklist|greylist> <names|values> <term>, show, quit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Show) => match load_lists(&foreground).await {
                    Ok(lists) => {
                        for key in ListKey::ALL {
                            println!("{}: {:?}", key.label(), lists.get(key).as_slice());
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                },
                Ok(Command::Edit(key, edit)) => {
                    if let Err(e) = edit_list(&foreground, key, &edit).await {
                        eprintln!("Error: {}", e);
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
            // Give the background task a turn
            tokio::task::yield_now().await;
        }

        drop(foreground);
        handle.await.map_err(|e| format!("Background task failed: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cw_core::badge::ALERT_COLOR;
    use cw_core::types::{Cookie, StorageArea};

    type Painted = Option<(String, Option<String>)>;

    fn cleared() -> Painted {
        Some((String::new(), None))
    }

    async fn wait_for_badge(
        aggregator: &BadgeAggregator<FixturePlatform>,
        expected: &Painted,
    ) -> bool {
        for _ in 0..200 {
            if aggregator.platform().badge(FIXTURE_TAB) == *expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_background_follows_store_changes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let tracker = Cookie {
            name: "_tracker_id".into(),
            value: "abc".into(),
            domain: ".example.com".into(),
            path: "/".into(),
            ..Default::default()
        };
        let (tx, rx) = broadcast::channel(16);

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let aggregator = Rc::new(BadgeAggregator::new(FixturePlatform::new(
                    FileStore::new(&path),
                    Some("https://www.example.com/".into()),
                    vec![tracker],
                )));
                let task = background_task(Rc::clone(&aggregator), rx);
                let handle = tokio::task::spawn_local(task);
                assert!(wait_for_badge(&aggregator, &cleared()).await);

                // Written behind the background's back: only a local list
                // change may trigger a recompute.
                std::fs::write(&path, r#"{"greylistNames": ["tracker"]}"#).unwrap();
                tx.send(StorageChange {
                    area: StorageArea::Sync,
                    keys: vec!["greylistNames".into()],
                })
                .unwrap();
                tx.send(StorageChange {
                    area: StorageArea::Local,
                    keys: vec!["theme".into()],
                })
                .unwrap();
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
                assert_eq!(aggregator.platform().badge(FIXTURE_TAB), cleared());

                let foreground = FileStore::new(&path).with_changes(tx);
                edit_list(&foreground, ListKey::BlacklistNames, &TermEdit::Add("track".into()))
                    .await
                    .unwrap();
                let alert = Some(("1".to_string(), Some(ALERT_COLOR.to_string())));
                assert!(wait_for_badge(&aggregator, &alert).await);

                drop(foreground);
                handle.await.unwrap();
            })
            .await;
    }

    #[test]
    fn test_parse_add_keeps_spaces_in_term() {
        assert_eq!(
            parse_command("add blacklist values session id"),
            Ok(Command::Edit(ListKey::BlacklistValues, TermEdit::Add("session id".into())))
        );
    }

    #[test]
    fn test_parse_remove_and_aliases() {
        assert_eq!(
            parse_command("remove grey names _ga"),
            Ok(Command::Edit(ListKey::GreylistNames, TermEdit::Remove("_ga".into())))
        );
        assert_eq!(parse_command(" show "), Ok(Command::Show));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("add blacklist names").is_err());
        assert!(parse_command("add purple names x").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use client::{FeedbackClient, Filter, Move, SessionEvent, Sort};
use serde::Serialize;
use shared::types::{NewBoard, NewFeedback, RegistrationData, Status, Visibility};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::render;
use crate::{BoardCommands, Commands, TableArgs};

pub async fn run(client: &FeedbackClient, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            let password = password_from(password)?;
            let claims = client
                .auth()
                .login(&username, &password)
                .await
                .context("Login failed")?;
            println!("Signed in as {} ({})", claims.username, claims.role());
        }
        Commands::Logout => {
            client.auth().logout();
            println!("Signed out");
        }
        Commands::Whoami => match client.auth().current_user() {
            Some(claims) if json => emit(&claims)?,
            Some(claims) => println!("{}", render::principal(&claims)),
            None => println!("Not signed in"),
        },
        Commands::Register {
            username,
            email,
            password,
        } => {
            let data = RegistrationData {
                username,
                password: password_from(password)?,
                email,
            };
            let user = client
                .auth()
                .register(&data)
                .await
                .context("Registration failed")?;
            println!("Registered {} (id {})", user.username, user.id);
        }
        Commands::Boards { command } => boards(client, command, json).await?,
        Commands::Kanban { board, watch } => kanban(client, board, watch, json).await?,
        Commands::Move {
            item,
            to,
            index,
            board,
        } => move_item(client, item, to, index, board).await?,
        Commands::Upvote { item, board } => {
            let board = board_or_first(client, board).await?;
            client.board().load(board).await?;
            let detail = client.board().upvote(item).await?;
            println!("{}", detail.detail);
        }
        Commands::Table(args) => table(client, args, json).await?,
        Commands::Submit {
            board,
            title,
            description,
            feedback_type,
            tags,
        } => {
            let item = NewFeedback {
                board,
                title,
                description,
                feedback_type,
                tag_ids: Vec::new(),
                tag_names: tags,
            };
            let created = client.gateway().create_feedback(&item).await?;
            if json {
                emit(&created)?;
            } else {
                println!("Created #{} {}", created.id, created.title);
            }
        }
        Commands::Comments { item, add } => {
            if let Some(content) = add {
                let comment = client.gateway().create_comment(item, &content).await?;
                println!("Comment #{} posted", comment.id);
            } else {
                let comments = client.gateway().list_comments(item).await?;
                if json {
                    emit(&comments)?;
                } else {
                    print!("{}", render::comments(&comments));
                }
            }
        }
        Commands::Tags { create } => {
            if let Some(name) = create {
                let tag = client.tags().ensure(&name).await?;
                println!("Tag #{} {}", tag.id, tag.name);
            } else {
                let tags = client.tags().refresh().await?;
                if json {
                    emit(&tags)?;
                } else {
                    print!("{}", render::tags(&tags));
                }
            }
        }
        Commands::Summary { board } => {
            let board = board_or_first(client, board).await?;
            client.board().load(board).await?;
            print!("{}", render::summary(&client.board().summary()));
        }
    }
    Ok(())
}

async fn boards(client: &FeedbackClient, command: Option<BoardCommands>, json: bool) -> Result<()> {
    match command.unwrap_or(BoardCommands::List) {
        BoardCommands::List => {
            let boards = client.gateway().list_boards().await?;
            if json {
                emit(&boards)?;
            } else {
                print!("{}", render::boards(&boards));
            }
        }
        BoardCommands::Create {
            name,
            description,
            private,
        } => {
            let visibility = if private {
                Visibility::Private
            } else {
                Visibility::Public
            };
            let board = client
                .gateway()
                .create_board(&NewBoard::new(name, description, visibility))
                .await?;
            println!("Created board #{} {}", board.id, board.name);
        }
        BoardCommands::AddMember { board, username } => {
            let detail = client.gateway().add_board_member(board, &username).await?;
            println!("{}", detail.detail);
        }
        BoardCommands::Delete { board } => {
            client.gateway().delete_board(board).await?;
            println!("Deleted board #{}", board);
        }
    }
    Ok(())
}

async fn kanban(client: &FeedbackClient, board: Option<i64>, watch: bool, json: bool) -> Result<()> {
    let board = board_or_first(client, board).await?;
    let engine = client.board();

    if !watch {
        engine.load(board).await?;
        let snapshot = engine.snapshot();
        if json {
            emit(&snapshot.columns.items().collect::<Vec<_>>())?;
        } else {
            print!("{}", render::kanban(&snapshot));
        }
        return Ok(());
    }

    let mut snapshots = engine.subscribe();
    let mut events = client.session().subscribe();
    engine.activate(board).await?;
    let mut shown = snapshots.borrow_and_update().clone();
    print!("{}", render::kanban(&shown));
    if engine.is_polling() {
        info!(
            "Refreshing every {}s, Ctrl-C to stop",
            client.config().sync.poll_interval_secs
        );
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !snapshot.loading && snapshot.columns != shown.columns {
                    print!("{}", render::kanban(&snapshot));
                    shown = snapshot;
                }
            }
            event = events.recv() => match event {
                Ok(SessionEvent::LoginRequired { reason }) => {
                    engine.deactivate();
                    bail!("Session ended ({}), run `feedback login` again", reason);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!("Missed {} session events", n),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                break;
            }
        }
    }

    engine.deactivate();
    Ok(())
}

async fn move_item(
    client: &FeedbackClient,
    item: i64,
    to: Status,
    index: Option<usize>,
    board: Option<i64>,
) -> Result<()> {
    let board = board_or_first(client, board).await?;
    let engine = client.board();
    engine.load(board).await?;

    let snapshot = engine.snapshot();
    let (from, from_index) = snapshot
        .columns
        .position(item)
        .ok_or_else(|| anyhow!("Item #{} is not on board #{}", item, board))?;
    let to_index = index.unwrap_or_else(|| end_of(snapshot.columns.column(to).len(), from == to));

    engine
        .move_item(Move {
            item_id: item,
            from,
            from_index,
            to,
            to_index,
        })
        .await?;
    println!("Moved #{} to {}", item, to.title());
    Ok(())
}

/// Last slot of a column once the dragged item has left its source.
fn end_of(column_len: usize, same_column: bool) -> usize {
    if same_column {
        column_len.saturating_sub(1)
    } else {
        column_len
    }
}

async fn table(client: &FeedbackClient, args: TableArgs, json: bool) -> Result<()> {
    let mut table = client.table();
    if let Some(size) = args.page_size {
        table.set_page_size(size).await?;
    }
    for filter in [
        Filter::Status(args.status),
        Filter::FeedbackType(args.feedback_type),
        Filter::Board(args.board),
        Filter::Tag(args.tag),
    ] {
        table.set_filter(filter).await?;
    }
    if let Some(field) = args.sort {
        let sort = if args.desc {
            Sort::descending(field.into())
        } else {
            Sort::ascending(field.into())
        };
        table.set_sort(Some(sort)).await?;
    }
    if args.page > 1 {
        table.set_page_index(args.page - 1).await?;
    } else {
        table.refresh().await?;
    }

    if json {
        emit(&table.view().items)?;
    } else {
        print!("{}", render::table(table.view(), table.state()));
    }
    Ok(())
}

async fn board_or_first(client: &FeedbackClient, board: Option<i64>) -> Result<i64> {
    if let Some(board) = board {
        return Ok(board);
    }
    let first = client
        .board()
        .first_board()
        .await
        .context("Failed to list boards")?;
    first
        .map(|b| b.id)
        .ok_or_else(|| anyhow!("No boards visible to this account"))
}

fn password_from(flag: Option<String>) -> Result<String> {
    if let Some(password) = flag.or_else(|| std::env::var("FEEDBACK_PASSWORD").ok()) {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

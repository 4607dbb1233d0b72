use std::error::Error;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use vemeet_client::common::{ChatCommand, ChatId, Message, NewMessage, UserId};
use vemeet_client::config::{self, AppConfig};
use vemeet_client::state::ToastKind;
use vemeet_client::sync::{ChatSession, LiveUpdate};
use vemeet_client::AppContext;

#[derive(Parser)]
#[command(
    name = "vemeet_client",
    version,
    about = "Terminal client for Vemeet chats, feed and notifications"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Open a chat: history, live messages and a prompt
    Chat {
        /// Signed-in user's id
        #[arg(long)]
        user_id: UserId,
        /// Existing chat to open
        #[arg(long, conflicts_with = "recipient_id")]
        chat_id: Option<ChatId>,
        /// Open (or start) the chat with this user instead
        #[arg(long)]
        recipient_id: Option<UserId>,
    },
    /// Print the home feed
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Print notifications, refreshing until Ctrl-C
    Notifications {
        #[arg(long)]
        watch: bool,
    },
    /// Write the default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if cli.mode == Mode::InitConfig {
        config::save_config(&cli.config, &AppConfig::default())?;
        println!("Wrote default config to {}", cli.config);
        return Ok(());
    }

    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides();
    let ctx = AppContext::new(app_config)?;

    let result = match cli.mode {
        Mode::Chat {
            user_id,
            chat_id,
            recipient_id,
        } => run_chat(&ctx, user_id, chat_id, recipient_id).await,
        Mode::Feed { pages } => run_feed(&ctx, pages).await,
        Mode::Notifications { watch } => run_notifications(&ctx, watch).await,
        Mode::InitConfig => Ok(()),
    };

    if let Err(err) = &result {
        log::error!("Client terminated: {err}");
    }
    result
}

async fn run_chat(
    ctx: &AppContext,
    user_id: UserId,
    chat_id: Option<ChatId>,
    recipient_id: Option<UserId>,
) -> Result<(), Box<dyn Error>> {
    let mut directory = ctx.chats();
    let chat = match (chat_id, recipient_id) {
        (Some(chat_id), _) => {
            directory.fetch().await?;
            directory
                .chat(chat_id)
                .cloned()
                .ok_or_else(|| format!("chat {chat_id} not found"))?
        }
        (None, Some(recipient_id)) => directory.open_or_create(recipient_id).await?,
        (None, None) => return Err("either --chat-id or --recipient-id is required".into()),
    };
    let recipient_id = chat.other_user.id;
    println!("Chatting with {}", chat.other_user.display_name());

    let first_time = chat.last_message.is_none();
    let mut session = ctx.chat_session(user_id, Some(chat.id), first_time);
    session.load_page(0).await?;
    for message in session.messages() {
        print_message(message);
    }
    if !session.connect_live_feed() {
        log::warn!("Live feed unavailable, only sent messages will appear");
    }
    println!("Type a message, /older for history, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ChatCommand::parse(&line) {
                    Some(ChatCommand::Quit) => break,
                    Some(ChatCommand::LoadOlder) => {
                        let before = session.messages().len();
                        if session.load_older().await.is_ok() {
                            let added = session.messages().len() - before;
                            for message in &session.messages()[..added] {
                                print_message(message);
                            }
                            if !session.has_more() {
                                println!("-- start of conversation --");
                            }
                        }
                    }
                    Some(ChatCommand::Send(text)) => {
                        if let Ok(sent) = session.send_message(NewMessage::text(recipient_id, text)).await {
                            print_message(&sent);
                        }
                    }
                    None => {}
                }
            }
            Some(update) = session.next_live_event() => {
                report_live(&session, update);
            }
        }
        print_toasts(ctx);
    }

    session.teardown();
    Ok(())
}

fn report_live(session: &ChatSession, update: LiveUpdate) {
    match update {
        LiveUpdate::Appended(id) => {
            if let Some(message) = session.messages().iter().find(|message| message.id == id) {
                print_message(message);
            }
        }
        LiveUpdate::Duplicate(_) => {}
        LiveUpdate::Connected => log::info!("Live feed connected"),
        LiveUpdate::Disconnected { retry_in } => {
            log::warn!("Live feed lost, reconnecting in {retry_in:?}");
        }
    }
}

async fn run_feed(ctx: &AppContext, pages: u32) -> Result<(), Box<dyn Error>> {
    let mut feed = ctx.feed();
    for page in 0..pages.max(1) {
        if !feed.load_feed(page).await? {
            break;
        }
    }

    for post in feed.posts() {
        println!(
            "[post {}] {}: {} ({} reactions)",
            post.id,
            post.user.display_name(),
            post.content,
            post.reactions.len()
        );
    }
    for recipe in feed.recipes() {
        println!(
            "[recipe {}] {} by {}",
            recipe.id,
            recipe.title,
            recipe.user.display_name()
        );
    }
    print_toasts(ctx);
    Ok(())
}

async fn run_notifications(ctx: &AppContext, watch: bool) -> Result<(), Box<dyn Error>> {
    let mut store = ctx.notifications();
    store.fetch_all().await?;
    for notification in store
        .message_notifications()
        .iter()
        .chain(store.other_notifications())
    {
        let marker = if notification.is_read { " " } else { "*" };
        println!("{marker} {:?}: {}", notification.notification_type, notification.content);
    }
    println!("{} unread", store.unread_count());

    if watch {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.cancel();
            }
        });
        store
            .run_refresh(ctx.config().notification_refresh(), cancel)
            .await;
        println!("{} unread", store.unread_count());
    }
    Ok(())
}

fn print_message(message: &Message) {
    let text = message.content.as_deref().unwrap_or("<attachment>");
    println!(
        "[{}] {}: {text}",
        message.created_at.format("%H:%M"),
        message.sender.display_name()
    );
}

fn print_toasts(ctx: &AppContext) {
    for toast in ctx.toasts().drain() {
        match toast.kind {
            ToastKind::Success => println!("✓ {}", toast.message),
            ToastKind::Error => eprintln!("! {}", toast.message),
        }
    }
}

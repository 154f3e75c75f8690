use clap::Parser;
use chatflow::{
    ChatReply, Error, FlowEngine, InternalResult, StartParams, TurnStatus, Typebot, Webhook,
    config::{self, EngineConfig, SecretConfig},
    store::InMemoryStore,
};
use std::{collections::HashMap, path::PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Run a typebot conversation in the terminal", long_about = None)]
struct Cli {
    /// Typebot definition (JSON)
    typebot: PathBuf,

    /// Engine config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Credentials file, keyed by credentials id
    #[arg(short, long, env = "CHATFLOW_SECRETS")]
    secrets: Option<PathBuf>,

    /// Webhook records (JSON array)
    #[arg(short, long)]
    webhooks: Option<PathBuf>,

    /// Prefilled variables as name=value
    #[arg(short = 'v', long = "var")]
    variables: Vec<String>,

    /// Do not record a result
    #[arg(long)]
    preview: bool,
}

fn prefilled_variables(pairs: &[String]) -> InternalResult<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| Error::config(format!("Expected name=value, got {}", pair)))
        })
        .collect()
}

fn print_reply(reply: &ChatReply) {
    for message in &reply.messages {
        match message.content.get("plainText").and_then(|text| text.as_str()) {
            Some(text) => println!("bot> {}", text),
            None => println!("bot> [{}] {}", message.kind, message.content),
        }
    }
    for action in &reply.client_side_actions {
        match serde_json::to_string(action) {
            Ok(json) => println!("action> {}", json),
            Err(e) => debug!("Failed to serialize action: {}", e),
        }
    }
    for log in &reply.logs {
        println!("log> [{:?}] {}", log.status, log.description);
    }
    if let Some(input) = &reply.input {
        let choices: Vec<&str> = input
            .items
            .iter()
            .filter_map(|item| item.content.as_deref())
            .collect();
        if choices.is_empty() {
            println!("({})", input.kind);
        } else {
            println!("({}: {})", input.kind, choices.join(" | "));
        }
    }
}

async fn run(cli: &Cli) -> InternalResult<()> {
    let engine_config: EngineConfig = if cli.config.exists() {
        config::from_file(&cli.config)?
    } else {
        EngineConfig::default()
    };
    debug!("config: {:?}", engine_config);

    let store = match &cli.secrets {
        Some(path) => InMemoryStore::with_secrets(config::from_file::<SecretConfig, _>(path)?),
        None => InMemoryStore::new(),
    };
    if let Some(path) = &cli.webhooks {
        let webhooks: Vec<Webhook> = config::from_file(path)?;
        for webhook in webhooks {
            store.insert_webhook(webhook);
        }
    }
    let typebot: Typebot = config::from_file(&cli.typebot)?;
    info!("Loaded typebot {} ({} groups)", typebot.id, typebot.groups.len());

    let engine = FlowEngine::in_memory(engine_config, store);
    let params = StartParams {
        prefilled_variables: prefilled_variables(&cli.variables)?,
        is_preview: cli.preview,
        ..Default::default()
    };
    let mut turn = engine.start_from_typebot(typebot, params).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_reply(&turn.reply);
        if turn.status == TurnStatus::Terminated {
            println!("(end of conversation)");
            return Ok(());
        }
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| Error::internal(format!("Failed to read stdin: {}", e)))?
        else {
            return Ok(());
        };
        turn = engine.continue_session(turn.new_session_state, &line).await?;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

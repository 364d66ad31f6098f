use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use how::config::FileCredentialStore;
use how::credentials::{self, PingValidator};
use how::executor::SystemShell;
use how::providers::CompletionClient;
use how::spinner::Spinner;
use how::{confirm, detect_platform, detect_shell, get_config_path, prompt};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("how")
        .version("0.1.0")
        .about("Get CLI answers for plain-text queries")
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Log debug data"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .action(ArgAction::SetTrue)
                .help("Configure API key"),
        )
        .arg(
            Arg::new("query")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("Enter your query in plain text. This will be used to generate a CLI command."),
        )
        .get_matches();

    let shell = detect_shell();
    let platform = detect_platform();

    if matches.get_flag("debug") {
        println!("shell: {shell}");
        println!("platform: {platform}");
        return Ok(());
    }

    let force_reconfigure = matches.get_flag("config");
    let query = matches
        .get_many::<String>("query")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let mut store = FileCredentialStore::new(get_config_path()?);
    let env_credential = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let validator = PingValidator::new();

    let api_key = match credentials::resolve(
        &mut store,
        env_credential,
        force_reconfigure,
        &validator,
    )
    .await
    {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    if query.trim().is_empty() {
        if force_reconfigure {
            // a bare `how -c` run only wanted the key saved
            return Ok(());
        }
        eprintln!("error: missing required argument 'query'");
        std::process::exit(1);
    }

    let messages = prompt::build_messages(&query, &shell, platform);
    let client = CompletionClient::new(api_key);

    let spinner = Spinner::start("Executing Magic ✨");
    let result = client.complete(&messages).await;
    spinner.stop();

    let suggestion = match result {
        Ok(suggestion) => suggestion,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let runner = SystemShell::new(shell);
    confirm::run(&suggestion, &runner)?;

    Ok(())
}

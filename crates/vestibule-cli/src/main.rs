//! Vestibule CLI - session secret and token tool
//!
//! Generates and checks signing secrets, mints session tokens for testing and
//! support, and decodes tokens to see who they belong to and when they expire.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod error;
mod output;

use error::{CliError, Result};
use vestibule::observability::{self, LogFormat, ObservabilityConfig};
use vestibule::secret::{generate_secret, SecretPolicy};
use vestibule::{parse_duration, SessionCodec, SessionSecret, SessionUser};

/// Vestibule CLI - session secrets and tokens
#[derive(Parser)]
#[command(name = "vestibule")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Signing secret (at least 32 characters)
    #[arg(long, env = "SESSION_SECRET", global = true, hide_env_values = true)]
    secret: Option<String>,

    /// Log verification details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate or check signing secrets
    #[command(subcommand)]
    Secret(SecretCommand),

    /// Mint or inspect session tokens
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand)]
enum SecretCommand {
    /// Print a new random secret
    Generate {
        /// Secret length in characters (minimum 32)
        #[arg(short, long, default_value_t = 64)]
        length: usize,
    },

    /// Validate a secret (defaults to --secret / SESSION_SECRET)
    Check {
        /// Secret to check
        value: Option<String>,

        /// Environment whose advisory policy applies
        #[arg(short, long, default_value = "production")]
        env: String,

        /// Treat advisory warnings as errors
        #[arg(short, long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum TokenCommand {
    /// Mint a session token
    Mint {
        /// User id
        #[arg(long)]
        id: String,

        /// User email
        #[arg(long)]
        email: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Role tag, repeatable
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Token lifetime, e.g. 30m, 8h, 7d
        #[arg(long, default_value = "24h")]
        max_age: String,
    },

    /// Verify and decode a session token
    Inspect {
        /// Token to inspect
        token: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = init_logging(cli.verbose).and_then(|()| match cli.command {
        Commands::Secret(SecretCommand::Generate { length }) => cmd_secret_generate(length),

        Commands::Secret(SecretCommand::Check { value, env, strict }) => {
            cmd_secret_check(value.or(cli.secret), &env, strict)
        }

        Commands::Token(TokenCommand::Mint {
            id,
            email,
            name,
            roles,
            max_age,
        }) => {
            let mut user = SessionUser::new(id);
            user.email = email;
            user.name = name;
            user.roles = roles;
            cmd_token_mint(cli.secret, &user, &max_age)
        }

        Commands::Token(TokenCommand::Inspect { token, json }) => {
            cmd_token_inspect(cli.secret, &token, json)
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    if !verbose {
        return Ok(());
    }

    let config = ObservabilityConfig::builder()
        .log_format(LogFormat::Compact)
        .log_filter("vestibule=debug")
        .with_source_location(false)
        .build();
    observability::init(config)?;
    Ok(())
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_secret_generate(length: usize) -> Result<()> {
    if length < vestibule::MIN_SECRET_LENGTH {
        output::warning(&format!(
            "Length {} is below the minimum, generating {} characters",
            length,
            vestibule::MIN_SECRET_LENGTH
        ));
    }

    println!("{}", generate_secret(length));
    Ok(())
}

fn cmd_secret_check(value: Option<String>, env: &str, strict: bool) -> Result<()> {
    let secret = load_secret(value)?;
    output::success(&format!("Secret accepted ({} characters)", secret.len()));

    let warnings = SecretPolicy::for_environment(env).review(&secret);
    for warning in &warnings {
        output::warning(&warning.to_string());
    }

    if warnings.is_empty() {
        output::success(&format!("No advisory findings for {}", env));
    } else if strict {
        return Err(CliError::SecretWarnings {
            count: warnings.len(),
        });
    }

    Ok(())
}

fn cmd_token_mint(secret: Option<String>, user: &SessionUser, max_age: &str) -> Result<()> {
    let max_age = parse_duration(max_age)
        .ok_or_else(|| CliError::invalid("--max-age", format!("cannot parse {:?}", max_age)))?;

    let codec = SessionCodec::new(load_secret(secret)?);
    let token = codec.encode(user, Some(max_age))?;

    output::info(&format!(
        "Token for {} valid for {}",
        user.id,
        output::format_duration(max_age.as_secs())
    ));
    println!("{}", token);
    Ok(())
}

fn cmd_token_inspect(secret: Option<String>, token: &str, json: bool) -> Result<()> {
    let codec = SessionCodec::new(load_secret(secret)?);
    let payload = codec.decode(token.trim()).ok_or(CliError::InvalidToken)?;

    if json {
        output::print_json(&payload)?;
    } else {
        output::print_payload(&payload, codec.now_millis());
    }

    Ok(())
}

fn load_secret(value: Option<String>) -> Result<SessionSecret> {
    let value = value.ok_or(CliError::MissingSecret)?;
    Ok(SessionSecret::new(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mint() {
        let cli = Cli::try_parse_from([
            "vestibule",
            "--secret",
            "0123456789abcdef0123456789abcdef",
            "token",
            "mint",
            "--id",
            "usr_1",
            "--role",
            "admin",
            "--role",
            "editor",
            "--max-age",
            "8h",
        ])
        .unwrap();

        match cli.command {
            Commands::Token(TokenCommand::Mint { id, roles, max_age, .. }) => {
                assert_eq!(id, "usr_1");
                assert_eq!(roles, ["admin", "editor"]);
                assert_eq!(max_age, "8h");
            }
            _ => panic!("expected token mint"),
        }
    }

    #[test]
    fn test_load_secret() {
        assert!(matches!(load_secret(None), Err(CliError::MissingSecret)));
        assert!(matches!(
            load_secret(Some("short".into())),
            Err(CliError::Secret(_))
        ));
        assert!(load_secret(Some("x".repeat(32))).is_ok());
    }

    #[test]
    fn test_inspect_rejects_foreign_token() {
        let other = SessionCodec::new(SessionSecret::new("y".repeat(40)).unwrap());
        let token = other.encode(&SessionUser::new("usr_1"), None).unwrap();

        let result = cmd_token_inspect(Some("x".repeat(40)), &token, true);
        assert!(matches!(result, Err(CliError::InvalidToken)));
    }
}

use anyhow::{Context, Result};
use auth::credential::KDF_DEFAULT_ITERATIONS;
use auth::{Credential, hash_credential, verify_credential};
use clap::{Parser, Subcommand};
use colored::*;
use scripty::*;
use std::path::Path;

/// Storefront auth project automation tool
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "A task runner for the storefront auth project")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a local environment file
    Init {
        /// Environment name (dev, staging, prod)
        #[arg(short, long, default_value = "dev")]
        env: String,
        /// Address for the API to listen on
        #[arg(short, long, default_value = "127.0.0.1:4000")]
        bind: String,
    },
    /// Run the API locally
    Serve {
        /// Environment file to load
        #[arg(short, long, default_value = "dev")]
        env: String,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Restrict to one package (auth, api)
        #[arg(short = 'P', long)]
        package: Option<String>,
        /// Run specific test pattern
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Derive a salted credential for a password
    HashPassword {
        password: String,
        /// Hex salt to reuse instead of generating one
        #[arg(short, long)]
        salt: Option<String>,
        #[arg(short, long, default_value_t = KDF_DEFAULT_ITERATIONS)]
        iterations: u32,
        /// Stored hash to check the password against
        #[arg(long, requires = "salt")]
        verify: Option<String>,
    },
    /// Clean build artifacts and temporary files
    Clean,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure we're in the project root
    if !Path::new("Cargo.toml").exists() {
        anyhow::bail!("Must be run from the project root directory");
    }

    match args.command {
        Command::Init { env, bind } => {
            println!("{}", "🚀 Initializing storefront auth project...".green().bold());
            init_command(&env, &bind)?;
        }
        Command::Serve { env, release } => {
            println!("{}", "🌐 Starting storefront API...".blue().bold());
            serve_command(&env, release)?;
        }
        Command::Test { package, pattern } => {
            println!("{}", "🧪 Running tests...".yellow().bold());
            test_command(package.as_deref(), pattern.as_deref())?;
        }
        Command::HashPassword {
            password,
            salt,
            iterations,
            verify,
        } => {
            hash_password_command(&password, salt.as_deref(), iterations, verify)?;
        }
        Command::Clean => {
            println!("{}", "🧹 Cleaning up...".red().bold());
            clean_command()?;
        }
    }

    println!("{}", "✅ Task completed successfully!".green().bold());
    Ok(())
}

fn init_command(env: &str, bind: &str) -> Result<()> {
    println!("📋 Checking required tools...");
    cmd!("cargo", "--version")
        .run()
        .context("cargo is required but not found")?;

    println!("📄 Generating environment configuration...");
    generate_env_config(env, bind)?;

    println!("{}", "✨ Initialization complete!".green());
    println!("Next steps:");
    println!("1. Review and update .env.{env}");
    println!("2. Run 'cargo xtask serve --env {env}' to start the API");

    Ok(())
}

fn env_config_content(env: &str, bind: &str) -> String {
    let seed = env != "prod";

    format!(
        r#"# Storefront auth configuration for environment: {env}
ENVIRONMENT={env}
BIND_ADDRESS={bind}

# JWT Configuration
JWT_SECRET=your-jwt-secret-change-this-in-production
JWT_ISSUER=storefront-auth
JWT_EXPIRES_IN=3600

# Two-factor challenges
CHALLENGE_TTL_SECONDS=300
CHALLENGE_SWEEP_INTERVAL_SECONDS=60

# Credentials
KDF_ITERATIONS={KDF_DEFAULT_ITERATIONS}
SEED_DEMO_USERS={seed}

RUST_LOG=info
"#
    )
}

fn generate_env_config(env: &str, bind: &str) -> Result<()> {
    let config_content = env_config_content(env, bind);
    let config_file = format!(".env.{env}");
    std::fs::write(&config_file, config_content).with_context(|| format!("Failed to write {config_file}"))?;

    println!("✅ Generated configuration: {config_file}");
    Ok(())
}

/// Reads the variables defined in an env file without touching the current process.
fn load_env_file(path: &str) -> Result<Vec<(String, String)>> {
    dotenvy::from_filename_iter(path)
        .with_context(|| format!("Failed to read {path}"))?
        .map(|item| item.with_context(|| format!("Failed to parse {path}")))
        .collect()
}

fn serve_command(env: &str, release: bool) -> Result<()> {
    let env_file = format!(".env.{env}");
    let vars = if Path::new(&env_file).exists() {
        println!("📄 Loading {env_file}");
        load_env_file(&env_file)?
    } else {
        println!("{}", format!("⚠️  {env_file} not found, using defaults").yellow());
        Vec::new()
    };

    let mut serve_cmd = cmd!("cargo", "run", "-p", "api", "--bin", "storefront-api");
    if release {
        serve_cmd = serve_cmd.arg("--release");
    }
    for (key, value) in &vars {
        serve_cmd = serve_cmd.env(key, value);
    }

    serve_cmd.run().context("Failed to run storefront API")?;
    Ok(())
}

fn test_command(package: Option<&str>, pattern: Option<&str>) -> Result<()> {
    let mut test_cmd = cmd!("cargo", "test");

    match package {
        Some(p) => {
            println!("🧪 Running tests for {p}...");
            test_cmd = test_cmd.arg("-p").arg(p);
        }
        None => {
            println!("🧪 Running workspace tests...");
            test_cmd = test_cmd.arg("--workspace");
        }
    }

    if let Some(p) = pattern {
        test_cmd = test_cmd.arg(p);
    }

    test_cmd.run().context("Tests failed")?;
    Ok(())
}

fn hash_password_command(password: &str, salt: Option<&str>, iterations: u32, verify: Option<String>) -> Result<()> {
    if iterations == 0 {
        anyhow::bail!("Iteration count must be at least 1");
    }

    if let (Some(salt), Some(hash)) = (salt, verify) {
        let stored = Credential {
            salt: salt.to_string(),
            hash,
        };
        if verify_credential(&stored, password, iterations) {
            println!("{}", "✅ Password matches".green());
        } else {
            anyhow::bail!("❌ Password does not match the stored hash");
        }
        return Ok(());
    }

    let credential = hash_credential(password, salt, iterations);
    println!("salt: {}", credential.salt);
    println!("hash: {}", credential.hash);
    Ok(())
}

fn clean_command() -> Result<()> {
    println!("🧹 Cleaning build artifacts...");
    cmd!("cargo", "clean").run().context("Failed to clean cargo artifacts")?;

    // Clean temporary files
    for temp_file in &[".env.tmp", "test-output.json", "coverage.json"] {
        if Path::new(temp_file).exists() {
            std::fs::remove_file(temp_file).with_context(|| format!("Failed to remove {temp_file}"))?;
        }
    }

    Ok(())
}

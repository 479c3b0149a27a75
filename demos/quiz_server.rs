//! Quiz server over a built-in sample quiz
//!
//! Run with: cargo run --example quiz_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example quiz_server                    # binds to 0.0.0.0:8080
//!   cargo run --example quiz_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example quiz_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!
//! ## Playing
//!
//! With netcat:
//!   nc localhost 8080
//!   {"type":"join","payload":{"quizId":"rust-basics","userId":"u1","name":"Ann"}}
//!   {"type":"answer","payload":{"questionId":"q1","optionId":"b"}}

use std::net::SocketAddr;
use std::time::Duration;

use quiz_rs::cache::StaticQuizLoader;
use quiz_rs::model::{Question, Quiz};
use quiz_rs::{CacheConfig, QuizServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "127.0.0.1:9000" -> 127.0.0.1:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: quiz_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
}

fn sample_quiz() -> Quiz {
    Quiz::new("rust-basics")
        .question(
            Question::new("q1", "Which keyword declares an immutable binding?", 10)
                .option("a", "var", false)
                .option("b", "let", true)
                .option("c", "mut", false),
        )
        .question(
            Question::new("q2", "What does `?` do on an Err value?", 20)
                .option("a", "Panics", false)
                .option("b", "Returns it early", true),
        )
        .question(
            Question::new("q3", "Is `Rc<T>` Send?", 0)
                .option("a", "Yes", false)
                .option("b", "No", true),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => ServerConfig::with_addr(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quiz_rs=debug".parse()?)
                .add_directive("quiz_server=debug".parse()?),
        )
        .init();

    let config = config.cache(CacheConfig::default().ttl(Duration::from_secs(300)));
    println!("Starting quiz server on {}", config.bind_addr);
    println!("Sample quiz: rust-basics (questions q1, q2, q3)");

    let server = QuizServer::new(config, StaticQuizLoader::new([sample_quiz()]));

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}

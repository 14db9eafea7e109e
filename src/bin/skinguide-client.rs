//! Demo client for the SkinGuide MCP server
//!
//! Spawns the server as a child process, runs the handshake and walks
//! through every tool, printing the results.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};

use skinguide_mcp::domain::Product;
use skinguide_mcp::mcp::protocol::Implementation;
use skinguide_mcp::{ClientError, McpClient};

/// Command line arguments for the demo client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server binary; defaults to skinguide-mcp next to this one
    #[arg(long)]
    server: Option<PathBuf>,

    /// Seconds to wait for each reply
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Extra arguments passed to the server
    #[arg(last = true)]
    server_args: Vec<String>,
}

/// Shape of `list_skin_types` as the client reads it back
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkinTypes {
    skin_types: Vec<SkinTypeRow>,
    total: usize,
}

#[derive(serde::Deserialize)]
struct SkinTypeRow {
    code: String,
    name: String,
    #[serde(default)]
    category: String,
    difficulty: u8,
    #[serde(default)]
    description: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductTypes {
    product_types: Vec<ProductTypeRow>,
    total: usize,
}

#[derive(serde::Deserialize)]
struct ProductTypeRow {
    id: String,
}

#[derive(serde::Deserialize)]
struct Products {
    total: usize,
    products: Vec<Product>,
}

fn default_server() -> Result<PathBuf, std::io::Error> {
    let mut path = std::env::current_exe()?;
    path.set_file_name(format!("skinguide-mcp{}", std::env::consts::EXE_SUFFIX));
    Ok(path)
}

fn section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}", "=".repeat(60));
}

fn stars(difficulty: u8) -> String {
    let filled = usize::from(difficulty.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    Ok(serde_json::from_value(value)?)
}

async fn demo_list_skin_types(client: &McpClient) -> Result<(), ClientError> {
    section("list_skin_types: all 16 Baumann skin types");
    let data: SkinTypes = decode(client.call_tool("list_skin_types", json!({})).await?)?;
    for skin_type in &data.skin_types {
        println!("  {}  {:<44} {}", skin_type.code, skin_type.name, stars(skin_type.difficulty));
    }
    println!("\n  Total: {} types", data.total);
    Ok(())
}

async fn demo_get_product_types(client: &McpClient) -> Result<(), ClientError> {
    section("get_product_types: available categories");
    let data: ProductTypes = decode(client.call_tool("get_product_types", json!({})).await?)?;
    for row in data.product_types.chunks(3) {
        let line: String = row.iter().map(|entry| format!("{:<28}", entry.id)).collect();
        println!("  {}", line);
    }
    println!("\n  Total: {} categories", data.total);
    Ok(())
}

async fn demo_get_skin_type_info(client: &McpClient) -> Result<(), ClientError> {
    section("get_skin_type_info: OSPT");
    let info: SkinTypeRow = decode(client.call_tool("get_skin_type_info", json!({"skinType": "OSPT"})).await?)?;
    println!("  Code       : {}", info.code);
    println!("  Name       : {}", info.name);
    println!("  Category   : {}", info.category);
    println!("  Difficulty : {} ({}/5)", stars(info.difficulty), info.difficulty);
    println!("  Description: {}", info.description);
    Ok(())
}

fn print_products(products: &[Product]) {
    for product in products {
        let name: String = product.name.chars().take(60).collect();
        println!("  {:<20}  ${:>7.2}  [{}]  {}", product.brand, product.price, product.product_type, name);
    }
}

async fn demo_search_us(client: &McpClient) -> Result<(), ClientError> {
    section("search_products: oily + sensitive (od=O, sr=S), budget $30, US");
    let data: Products = decode(
        client
            .call_tool("search_products", json!({"od": "O", "sr": "S", "budget": 30, "limit": 5}))
            .await?,
    )?;
    println!("  {} products found\n", data.total);
    print_products(&data.products);
    Ok(())
}

async fn demo_search_uae(client: &McpClient) -> Result<(), ClientError> {
    section("search_products: Moisturizer, country=UAE, limit 5");
    let data: Products = decode(
        client
            .call_tool("search_products", json!({"type": "Moisturizer", "country": "UAE", "limit": 5}))
            .await?,
    )?;
    println!("  {} products found\n", data.total);
    print_products(&data.products);
    Ok(())
}

async fn run_demos(client: &McpClient) -> Result<(), ClientError> {
    demo_list_skin_types(client).await?;
    demo_get_product_types(client).await?;
    demo_get_skin_type_info(client).await?;
    demo_search_us(client).await?;
    demo_search_uae(client).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("skinguide_mcp={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let server = match args.server {
        Some(path) => path,
        None => default_server()?,
    };
    println!("\nSkinGuide MCP Server: Rust client demo");
    println!("Server: {}", server.display());

    let client = McpClient::spawn(&server.to_string_lossy(), &args.server_args)?
        .with_timeout(Duration::from_secs(args.timeout_secs));
    client
        .initialize(Implementation {
            name: "skinguide-client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .await?;

    let outcome = run_demos(&client).await;
    client.shutdown().await?;

    match outcome {
        Ok(()) => {
            println!("\nAll demos complete.\n");
            Ok(())
        }
        Err(e) => {
            eprintln!("\n[FATAL] {}", e);
            Err(e.into())
        }
    }
}

use clap::{Parser, Subcommand};
use pixvault::logger::{self, LogLevel, LoggerConfig};
use pixvault::{
    BinaryPayload, ClientConfig, EditRequest, GenerationRequest, ImageResult, PixVaultClient,
    UploadRequest,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pixvault", version, about = "PixVault image API client")]
struct Cli {
    /// Log request and polling details.
    #[arg(long, global = true, env = "PIXVAULT_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image from a prompt and save it.
    Generate {
        project: String,
        prompt: String,
        /// Output size as WIDTHxHEIGHT, e.g. 800x600.
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,
    },
    /// Edit an image that already has a URL.
    Edit { url: String, instruction: String },
    /// Upload a local image, then edit it.
    EditFile {
        project: String,
        file: PathBuf,
        instruction: String,
    },
    /// Upload a local image and print its URL.
    Upload { project: String, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logger::init_with_config(LoggerConfig::new().with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = ClientConfig::from_env();
    logger::log_config_info(&config);
    let client = PixVaultClient::new(config)?;

    match cli.command {
        Command::Generate {
            project,
            prompt,
            size,
        } => {
            let mut request = GenerationRequest::new(project, prompt);
            if let Some((width, height)) = size {
                request = request.with_size(width, height);
            }
            save(&client.generate(request).await?)?;
        }
        Command::Edit { url, instruction } => {
            save(&client.edit(EditRequest::from_url(url, instruction)).await?)?;
        }
        Command::EditFile {
            project,
            file,
            instruction,
        } => {
            let request = EditRequest::from_upload(BinaryPayload::file(file), instruction)
                .with_project(project);
            save(&client.edit(request).await?)?;
        }
        Command::Upload { project, file } => {
            let uploaded = client
                .upload(UploadRequest::new(BinaryPayload::file(file), project))
                .await?;
            log::info!("📤 Uploaded {} as {}", uploaded.id, uploaded.path);
            println!("{}", client.image_url(&uploaded.path));
        }
    }

    Ok(())
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let parse = |side: &str| -> Result<u32, String> {
        match side.parse::<u32>() {
            Ok(0) => Err("dimensions must be greater than zero".to_string()),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("invalid dimension {:?}: {}", side, e)),
        }
    };
    Ok((parse(width)?, parse(height)?))
}

fn save(image: &ImageResult) -> std::io::Result<()> {
    let filename = image
        .content_path
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or("image.png")
        .to_string();
    fs::write(&filename, &image.data)?;
    log::info!("💾 Saved {} ({} bytes) from {}", filename, image.data.len(), image.url);
    println!("{}", image.url);
    Ok(())
}

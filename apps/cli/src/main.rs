use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use assetlens_core_sdk::{
    config::GatewayConfig, db, models::PhotoKind, prompts, server, settings, telemetry, vin,
    vision,
};

/**
 * \brief CLI 程序入口：本地管理设置、单次分析 / 解码、启动网关服务。
 */
#[derive(Parser, Debug)]
#[command(name = "assetlens", version, about = "AssetLens analysis gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /**
     * \brief 初始化设置表。
     * \details 只写入显式给出的项，其余保持原值；遥测开关每次都会按参数覆写。
     */
    Init {
        #[arg(long)]
        openai_api_key: Option<String>,
        #[arg(long)]
        smtp_server: Option<String>,
        #[arg(long)]
        smtp_port: Option<String>,
        #[arg(long)]
        smtp_username: Option<String>,
        #[arg(long)]
        smtp_password: Option<String>,
        #[arg(long)]
        from_name: Option<String>,
        #[arg(long)]
        to_address: Option<String>,
        #[arg(long)]
        cc_address: Option<String>,
        #[arg(long, default_value_t = false)]
        enable_telemetry: bool,
    },

    /**
     * \brief 对单张图片执行一次分析并打印模型回复。
     * \param image_url  图片地址（HTTP(S) URL 或 data URI）
     * \param photo_kind 照片类型，"nameplate" 走铭牌提取，其余走资产评估
     */
    Analyze {
        #[arg(long)]
        image_url: String,
        #[arg(long, default_value = "asset")]
        photo_kind: String,
    },

    /**
     * \brief 解码一个 17 位 VIN 并打印 vPIC 返回的 JSON。
     */
    Vin { vin: String },

    /**
     * \brief 启动网关 HTTP 服务。
     */
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GatewayConfig::from_env();

    let conn = db::open_db(&config.db_path).context("open database failed")?;
    db::migrate(&conn).context("apply migrations failed")?;
    let telemetry_enabled = db::get_telemetry_enabled(&conn).unwrap_or(false);
    telemetry::set_enabled(telemetry_enabled);

    match cli.command {
        Commands::Init {
            openai_api_key,
            smtp_server,
            smtp_port,
            smtp_username,
            smtp_password,
            from_name,
            to_address,
            cc_address,
            enable_telemetry,
        } => {
            let pairs = [
                (settings::OPENAI_API_KEY_SETTING, openai_api_key),
                ("email_smtp_server", smtp_server),
                ("email_port", smtp_port),
                ("email_username", smtp_username),
                ("email_password", smtp_password),
                ("email_from_name", from_name),
                ("email_to_address", to_address),
                ("email_cc_address", cc_address),
            ];
            let mut saved = 0usize;
            for (key, value) in pairs {
                if let Some(value) = value {
                    db::set_setting(&conn, key, &value).context("save setting failed")?;
                    saved += 1;
                }
            }
            db::set_telemetry_enabled(&conn, enable_telemetry).context("save telemetry failed")?;
            telemetry::set_enabled(enable_telemetry);
            println!("Saved {} setting(s) to {}", saved, config.db_path);
        }
        Commands::Analyze {
            image_url,
            photo_kind,
        } => {
            let state = server::AppState::new(config).context("build http client failed")?;
            let api_key = settings::resolve_openai_api_key(&state.settings)?;
            let kind = PhotoKind::from_hint(Some(photo_kind.as_str()));
            telemetry::log_event(
                "cli.analyze",
                &format!(
                    "imageUrl={} photoType={}",
                    telemetry::truncate_for_log(&image_url, 100),
                    kind
                ),
            );
            let analysis = vision::analyze_image(
                &state.http,
                &state.config.openai_api_base,
                &api_key,
                &image_url,
                prompts::select_prompt(kind),
            )
            .await?;
            println!("{}", analysis);
        }
        Commands::Vin { vin } => {
            let state = server::AppState::new(config).context("build http client failed")?;
            let decoded = vin::decode_vin(&state.http, &state.config.vpic_api_base, &vin).await?;
            println!("{}", decoded);
        }
        Commands::Serve { addr } => {
            server::run(&addr, config).await?;
        }
    }

    Ok(())
}

//! tawzi3 portal CLI

use clap::Parser;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tawzi3_portal::{
    config::{Args, Command, StoreBackend},
    db::{MongoClient, MongoRecordStore},
    services::QrPayload,
    session::SessionFile,
    store::{MemoryRecordStore, RecordStore, TimeoutStore},
    Portal, PortalError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tawzi3_portal={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(2);
    }

    let store = match connect(&args).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Record store unavailable");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    let portal = Portal::new(store, args.vocabulary());
    let sessions = SessionFile::new(&args.session_file);

    if let Err(e) = run(&args, &portal, &sessions).await {
        if e.is_store_failure() {
            error!(error = %e, "Command failed");
        } else {
            info!(error = %e, "Command rejected");
        }
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

async fn connect(args: &Args) -> tawzi3_portal::Result<Arc<dyn RecordStore>> {
    let timeout = args.store_timeout();
    match args.store {
        StoreBackend::Mongo => {
            let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
            let store = MongoRecordStore::new(mongo);
            store.ensure_indexes().await?;
            Ok(Arc::new(TimeoutStore::new(store, timeout)))
        }
        StoreBackend::Memory => {
            let seed = args
                .seed
                .as_deref()
                .ok_or_else(|| PortalError::Config("--seed is required with the memory store".into()))?;
            let store = MemoryRecordStore::from_seed_file(seed)?;
            Ok(Arc::new(TimeoutStore::new(store, timeout)))
        }
    }
}

async fn run(args: &Args, portal: &Portal, sessions: &SessionFile) -> tawzi3_portal::Result<()> {
    match &args.command {
        Command::Login {
            national_id,
            credential,
        } => {
            let session = portal.login.login(national_id, credential).await?;
            sessions.save(&session)?;
            info!(path = %sessions.path().display(), "Session saved");
            let name = session.beneficiary().head_name.clone().unwrap_or_default();
            emit(args.json, &session.beneficiary_key, format!("تم تسجيل الدخول بنجاح {name}"));
        }
        Command::Logout => {
            sessions.clear()?;
            info!(path = %sessions.path().display(), "Session cleared");
            emit(args.json, &"ok", "تم تسجيل الخروج");
        }
        Command::Whoami => {
            let session = sessions.require()?;
            let name = session.beneficiary().head_name.clone().unwrap_or_default();
            emit(
                args.json,
                &session.profile,
                format!("{name} ({}/{})", session.camp_id, session.beneficiary_key),
            );
        }
        Command::Profile => {
            let session = sessions.require()?;
            let profile = portal.profile.load(&session).await?;
            let summary = format!(
                "{} | {} | {} | أفراد الأسرة: {}",
                profile.head_name, profile.head_id_number, profile.camp_name, profile.family_total
            );
            emit(args.json, &profile, summary);
        }
        Command::Parcels => {
            let session = sessions.require()?;
            let parcels = portal.parcels.resolve_for_session(&session).await?;
            let lines = if parcels.is_empty() {
                "لا توجد طرود حالياً".to_string()
            } else {
                parcels
                    .iter()
                    .map(|p| {
                        format!(
                            "{}\t{}\t{}\t{}\t{}",
                            p.parcel_date, p.parcel_name, p.parcel_type, p.parcel_status, p.distribution_status
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            emit(args.json, &parcels, lines);
        }
        Command::Complain { text } => {
            let session = sessions.require()?;
            let key = portal.complaints.submit(&session, text).await?;
            emit(args.json, &key, format!("تم إرسال الشكوى بنجاح ({key})"));
        }
        Command::Complaint { key } => {
            let session = sessions.require()?;
            let complaint = portal.complaints.fetch(&session, key).await?;
            let created = complaint
                .created_at
                .map(|t| t.to_chrono().to_rfc3339())
                .unwrap_or_default();
            let line = format!("{}\t{}\t{}", created, complaint.status, complaint.complaint_text);
            emit(args.json, &complaint, line);
        }
        Command::ChangePassword {
            current,
            new_password,
            confirm,
        } => {
            let mut session = sessions.require()?;
            portal
                .passwords
                .change(&mut session, current, new_password, confirm)
                .await?;
            sessions.save(&session)?;
            emit(args.json, &"ok", "تم تغيير كلمة المرور بنجاح");
        }
        Command::Qr { compact: true } => {
            let session = sessions.require()?;
            println!("{}", QrPayload::compact_json(&session));
        }
        Command::Qr { compact: false } => {
            let session = sessions.require()?;
            let payload = QrPayload::for_session(&session);
            let text = payload.text.clone();
            emit(args.json, &payload, text);
        }
    }
    Ok(())
}

/// Print a result as JSON or as text
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl Display) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(body) => println!("{body}"),
            Err(e) => error!(error = %e, "Failed to serialize output"),
        }
    } else {
        println!("{text}");
    }
}

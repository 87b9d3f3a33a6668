//! `gobarber` command-line client.
//!
//! Drives the same session store and slot selector as the web client, with a
//! JSON file standing in for device storage.

mod api;
mod config;
mod error;
mod store;


use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use gobarber::alert;
use gobarber::api::{AvailabilityQuery, SchedulingApi};
use gobarber::forms::{ProfileForm, SignInForm};
use gobarber::models::AvailabilitySlot;
use gobarber::profile::{AvatarOutcome, AvatarPick, ProfileError, change_avatar, submit_profile};
use gobarber::schedule::{HourSlot, SlotSelector, fetch_providers, partition};
use gobarber::session::SessionStore;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing_subscriber::EnvFilter;

use crate::api::ReqwestApi;
use crate::config::{CliConfig, DEFAULT_API_URL};
use crate::error::CliError;
use crate::store::FileStore;

type CliSession = SessionStore<FileStore, ReqwestApi>;

#[derive(Parser, Debug)]
#[command(name = "gobarber", about = "GoBarber scheduling client")]
struct Cli {
    #[arg(long, env = "GOBARBER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Session file; defaults to `session.json` in the platform data dir.
    #[arg(long, env = "GOBARBER_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a session and remember it.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GOBARBER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    SignOut,
    /// Show the signed-in user.
    Whoami,
    /// List providers.
    Providers,
    /// Show a provider's morning and afternoon slots for a day.
    Availability(DayArgs),
    /// Book an hour with a provider.
    Book {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long)]
        hour: u8,
    },
    /// Update name, email or password.
    Profile(ProfileArgs),
    /// Upload a new avatar image.
    Avatar { file: PathBuf },
}

#[derive(Args, Debug)]
struct DayArgs {
    provider_id: String,
    /// `YYYY-MM-DD`; defaults to today.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long, env = "GOBARBER_OLD_PASSWORD", hide_env_values = true)]
    old_password: Option<String>,
    #[arg(long, env = "GOBARBER_NEW_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long)]
    password_confirmation: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    init_tracing();
    let cli = Cli::parse();
    let config = CliConfig::resolve(&cli.api_url, cli.store)?;
    tracing::debug!(api_url = %config.api_url, store = %config.store_path.display(), "resolved config");

    let session = SessionStore::new(FileStore::new(&config.store_path), ReqwestApi::new(&config.api_url));
    session.restore();

    match cli.command {
        Command::SignIn { email, password } => run_sign_in(&session, email, password).await,
        Command::SignOut => {
            session.sign_out();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => run_whoami(&session),
        Command::Providers => run_providers(&session).await,
        Command::Availability(day) => run_availability(&session, day).await,
        Command::Book { day, hour } => run_book(&session, day, hour).await,
        Command::Profile(args) => run_profile(&session, args).await,
        Command::Avatar { file } => run_avatar(&session, &file).await,
    }
}

/// `GOBARBER_LOG` wins over `RUST_LOG`; defaults to warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GOBARBER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn require_session(session: &CliSession) -> Result<(), CliError> {
    if session.is_signed_in() { Ok(()) } else { Err(CliError::NotSignedIn) }
}

async fn run_sign_in(session: &CliSession, email: String, password: String) -> Result<(), CliError> {
    let credentials = SignInForm { email, password }.validate().map_err(CliError::Invalid)?;
    let user = session
        .sign_in(&credentials)
        .await
        .map_err(|e| CliError::rejected(alert::SIGN_IN_FAILED, e))?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

fn run_whoami(session: &CliSession) -> Result<(), CliError> {
    let user = session.user().ok_or(CliError::NotSignedIn)?;
    println!("{} <{}>", user.name, user.email);
    if let Some(url) = user.avatar_url {
        println!("avatar: {url}");
    }
    Ok(())
}

async fn run_providers(session: &CliSession) -> Result<(), CliError> {
    require_session(session)?;
    let providers = fetch_providers(session.api()).await;
    if providers.is_empty() {
        println!("No providers available.");
    }
    for provider in providers {
        println!("{}\t{}", provider.id, provider.name);
    }
    Ok(())
}

async fn run_availability(session: &CliSession, day: DayArgs) -> Result<(), CliError> {
    require_session(session)?;
    let date = resolve_date(day.date.as_deref())?;
    let slots = load_day(session, &day.provider_id, date).await?;
    print!("{}", render_day(date, &slots));
    Ok(())
}

async fn run_book(session: &CliSession, day: DayArgs, hour: u8) -> Result<(), CliError> {
    require_session(session)?;
    let date = resolve_date(day.date.as_deref())?;
    let slots = load_day(session, &day.provider_id, date).await?;

    let mut selector = SlotSelector::new(day.provider_id, date);
    selector.apply_availability(slots);
    if !selector.availability().iter().any(|slot| slot.hour == hour && slot.available) {
        return Err(CliError::HourUnavailable { hour });
    }
    selector.select_hour(hour);

    let request = selector
        .confirm(session.api(), local_offset(date, hour))
        .await
        .map_err(|e| CliError::rejected(e.alert(), e))?;
    println!("Appointment booked for {}", describe(request.date));
    Ok(())
}

async fn run_profile(session: &CliSession, args: ProfileArgs) -> Result<(), CliError> {
    let current = session.user().ok_or(CliError::NotSignedIn)?;
    let form = apply_profile_args(ProfileForm::from_user(&current), args);
    match submit_profile(session, &form).await {
        Ok(user) => {
            println!("{}", alert::PROFILE_UPDATED);
            println!("{} <{}>", user.name, user.email);
            Ok(())
        }
        Err(ProfileError::Invalid(errors)) => Err(CliError::Invalid(errors)),
        Err(e) => Err(CliError::rejected(alert::PROFILE_UPDATE_FAILED, e)),
    }
}

async fn run_avatar(session: &CliSession, file: &Path) -> Result<(), CliError> {
    require_session(session)?;
    let bytes = std::fs::read(file)
        .map_err(|source| CliError::Read { path: file.display().to_string(), source })?;
    let pick = AvatarPick::Picked {
        file_name: file.file_name().map(|name| name.to_string_lossy().into_owned()),
        content_type: content_type_for(file).map(ToOwned::to_owned),
        bytes: Some(bytes),
    };
    match change_avatar(session, pick).await {
        AvatarOutcome::Updated(user) => {
            println!("Avatar updated: {}", user.avatar_url.unwrap_or_default());
            Ok(())
        }
        AvatarOutcome::Failed(alert) => Err(CliError::rejected(alert, file.display())),
        AvatarOutcome::Ignored => {
            println!("Nothing to upload.");
            Ok(())
        }
    }
}

/// Fetch one day. Unlike the screens, a failed lookup is an error here since
/// there is no previous list to keep showing.
async fn load_day(session: &CliSession, provider_id: &str, date: Date) -> Result<Vec<AvailabilitySlot>, CliError> {
    let query = AvailabilityQuery::new(provider_id, date);
    Ok(session.api().day_availability(&query).await?)
}

fn resolve_date(value: Option<&str>) -> Result<Date, CliError> {
    match value {
        Some(value) => parse_date(value),
        None => Ok(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()).date()),
    }
}

fn parse_date(value: &str) -> Result<Date, CliError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| CliError::InvalidDate(value.to_owned()))
}

/// Local offset in effect at `hour` on `date`; UTC when it cannot be read.
fn local_offset(date: Date, hour: u8) -> UtcOffset {
    let Ok(time) = Time::from_hms(hour, 0, 0) else {
        return UtcOffset::UTC;
    };
    let instant = PrimitiveDateTime::new(date, time).assume_utc();
    UtcOffset::local_offset_at(instant).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "local offset unavailable, booking in UTC");
        UtcOffset::UTC
    })
}

fn describe(date: OffsetDateTime) -> String {
    let label = format_description!("[year]-[month]-[day] at [hour]:[minute]h");
    date.format(label).unwrap_or_else(|_| date.to_string())
}

fn render_section(title: &str, slots: &[HourSlot]) -> String {
    let mut out = format!("{title}\n");
    if slots.is_empty() {
        out.push_str("  (none)\n");
    }
    for slot in slots {
        let marker = if slot.available { "" } else { "  unavailable" };
        out.push_str(&format!("  {}{marker}\n", slot.label));
    }
    out
}

fn render_day(date: Date, slots: &[AvailabilitySlot]) -> String {
    let (morning, afternoon) = partition(slots);
    format!("{date}\n{}{}", render_section("Morning", &morning), render_section("Afternoon", &afternoon))
}

fn apply_profile_args(mut form: ProfileForm, args: ProfileArgs) -> ProfileForm {
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(email) = args.email {
        form.email = email;
    }
    form.old_password = args.old_password.unwrap_or_default();
    form.password = args.password.unwrap_or_default();
    form.password_confirmation = args.password_confirmation.unwrap_or_default();
    form
}

fn content_type_for(file: &Path) -> Option<&'static str> {
    let ext = file.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

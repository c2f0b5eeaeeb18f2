//! Fills the configured database with a handful of demo streams, so a fresh
//! checkout has something to show. Every seeded post expires like any other.

use anyhow::{bail, Context};
use configs::Settings;
use domains::{Author, MatchPeriod, Platform, Quality, SystemClock};
use services::{publish, StreamSubmission};
use storage_adapters::SqliteDocumentStore;

fn demo(
    teams: &str,
    platform: Platform,
    link: &str,
    league: &str,
    period: MatchPeriod,
    quality: Quality,
) -> StreamSubmission {
    StreamSubmission {
        teams: teams.into(),
        platform,
        other_platform_label: String::new(),
        link: link.into(),
        match_period: period,
        league: league.into(),
        other_league_label: String::new(),
        quality,
        language: "es".into(),
        has_commentary: true,
        cover_image_url: None,
    }
}

fn demo_streams() -> Vec<StreamSubmission> {
    let mut rumble = demo(
        "Boca Juniors vs River Plate",
        Platform::Other,
        "https://rumble.com/live/superclasico",
        "other",
        MatchPeriod::Halftime,
        Quality::P720,
    );
    rumble.other_platform_label = "Rumble".into();
    rumble.other_league_label = "Liga Profesional".into();

    vec![
        demo(
            "Real Madrid vs Barcelona",
            Platform::Youtube,
            "https://www.youtube.com/watch?v=elclasico",
            "laliga",
            MatchPeriod::FirstHalf,
            Quality::P1080,
        ),
        demo(
            "Manchester City vs Liverpool",
            Platform::Twitch,
            "https://www.twitch.tv/futbol_en_vivo",
            "premier",
            MatchPeriod::SecondHalf,
            Quality::Uhd4k,
        ),
        demo(
            "América vs Chivas",
            Platform::Kick,
            "https://kick.com/clasico_nacional",
            "ligamx",
            MatchPeriod::ExtraTime,
            Quality::P480,
        ),
        rumble,
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let settings = Settings::load().context("loading settings")?;
    let Some(url) = settings.database_url() else {
        bail!("set ULTRAGOL_DATABASE_URL to the database to seed");
    };
    let store = SqliteDocumentStore::new(url)
        .await
        .with_context(|| format!("opening database {url}"))?;

    let author = Author {
        id: "seed".into(),
        name: "ULTRAGOL".into(),
        avatar_url: None,
    };
    for submission in demo_streams() {
        let teams = submission.teams.clone();
        let id = publish(&store, &SystemClock, &author, submission)
            .await
            .with_context(|| format!("seeding {teams}"))?;
        tracing::info!(post_id = %id, %teams, "seeded");
    }
    Ok(())
}

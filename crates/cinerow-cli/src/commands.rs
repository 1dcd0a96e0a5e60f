use cinerow_api::TmdbClient;
use cinerow_core::catalog::CatalogPage;
use cinerow_core::config::AppConfig;
use cinerow_core::models::TitleKey;
use cinerow_runtime::{Runtime, RuntimeError};

use crate::format;
use crate::{ConfigAction, FavoritesAction, HistoryAction};

type Rt = Runtime<TmdbClient>;

pub async fn browse(rt: &Rt, page: CatalogPage, limit: usize) -> Result<(), RuntimeError> {
    let content = rt.load_page(page).await;

    if let Some(featured) = &content.featured {
        println!("Featured: {}", format::title_line(featured));
        if !featured.description.is_empty() {
            println!("  {}", format::truncate(&featured.description, 160));
        }
        println!();
    }

    if content.rows.iter().all(|r| r.titles.is_empty()) {
        println!("Nothing to show on {page}.");
        return Ok(());
    }

    for row in &content.rows {
        println!("{}", row.heading);
        for title in row.titles.iter().take(limit) {
            println!("  {}", format::title_line(title));
        }
        if row.titles.len() > limit {
            println!("  … {} more", row.titles.len() - limit);
        }
        println!();
    }
    Ok(())
}

pub async fn search(rt: &Rt, query: &str) -> Result<(), RuntimeError> {
    let min = rt.get_config().await.timing.min_query_len;
    if query.trim().chars().count() < min {
        return Err(RuntimeError::Invalid(format!(
            "search needs at least {min} characters"
        )));
    }

    let results = rt.search_now(query).await;
    if results.is_empty() {
        println!("No results for \"{query}\".");
    }
    for title in &results {
        println!("{}", format::title_line(title));
    }
    Ok(())
}

pub async fn details(rt: &Rt, key: TitleKey) -> Result<(), RuntimeError> {
    let title = rt.details(key).await?;

    println!("{}", format::title_line(&title));
    if !title.genres.is_empty() {
        println!("Genres: {}", title.genres.join(", "));
    }
    if !title.description.is_empty() {
        println!();
        println!("{}", title.description);
    }
    if let Some(cast) = title.cast.as_ref().filter(|c| !c.is_empty()) {
        println!();
        println!("Cast:");
        for member in cast {
            println!("  {}", format::cast_line(member));
        }
    }
    if let Some(trailer) = rt.trailer(&title) {
        println!();
        println!("Trailer: {}", trailer.url);
    }
    if rt.is_favorite(key).await {
        println!("In My List");
    }
    Ok(())
}

pub async fn similar(rt: &Rt, key: TitleKey) -> Result<(), RuntimeError> {
    let titles = rt.similar(key).await?;
    if titles.is_empty() {
        println!("No similar titles.");
    }
    for title in &titles {
        println!("{}", format::title_line(title));
    }
    Ok(())
}

pub async fn season(rt: &Rt, series_id: u64, number: u32) -> Result<(), RuntimeError> {
    let season = rt.season(series_id, number).await?;
    println!("{}", season.name);
    for ep in &season.episodes {
        println!("  {}", format::episode_line(ep));
    }
    Ok(())
}

pub async fn play(
    rt: &Rt,
    key: TitleKey,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<(), RuntimeError> {
    let title = rt.details(key).await?;
    let source = rt
        .play(&title, season, episode)
        .await
        .ok_or_else(|| RuntimeError::NotFound(format!("no playable source for {key}")))?;

    println!("Playing {}", title.name);
    println!("{}", source.url);
    Ok(())
}

pub async fn preview(rt: &Rt, key: TitleKey) -> Result<(), RuntimeError> {
    let title = rt.details(key).await?;
    let mut rx = rt.coordinator().subscribe();
    rt.preview(title);

    let preview = rx
        .wait_for(|p| p.title.is_some())
        .await
        .map_err(|e| RuntimeError::Api(e.to_string()))?
        .clone();

    if let Some(title) = &preview.title {
        println!("{}", format::title_line(title));
    }
    match preview.trailer_url {
        Some(url) => println!("Trailer: {url}"),
        None => println!("No trailer available."),
    }
    Ok(())
}

pub async fn favorites(rt: &Rt, action: FavoritesAction) -> Result<(), RuntimeError> {
    match action {
        FavoritesAction::List => {
            let titles = rt.favorites().await;
            if titles.is_empty() {
                println!("My List is empty.");
            }
            for title in &titles {
                println!("{}", format::title_line(title));
            }
        }
        FavoritesAction::Add(arg) => {
            let key = arg.key();
            if rt.is_favorite(key).await {
                println!("{key} is already in My List");
                return Ok(());
            }
            let title = rt.details(key).await?;
            let name = title.name.clone();
            if rt.add_favorite(title).await {
                println!("Added {name}");
            } else {
                println!("{key} is already in My List");
            }
        }
        FavoritesAction::Remove(arg) => {
            let key = arg.key();
            if !rt.is_favorite(key).await {
                return Err(RuntimeError::NotFound(format!("{key} is not in My List")));
            }
            rt.remove_favorite(key).await;
            println!("Removed {key}");
        }
        FavoritesAction::Toggle(arg) => {
            let title = rt.details(arg.key()).await?;
            let name = title.name.clone();
            if rt.toggle_favorite(title).await {
                println!("Added {name}");
            } else {
                println!("Removed {name}");
            }
        }
    }
    Ok(())
}

pub async fn history(rt: &Rt, action: HistoryAction) -> Result<(), RuntimeError> {
    match action {
        HistoryAction::List => {
            let entries = rt.history().await;
            if entries.is_empty() {
                println!("Nothing watched yet.");
            }
            for entry in &entries {
                println!("{}", format::history_line(entry));
            }
        }
        HistoryAction::Continue => {
            for entry in &rt.continue_watching().await {
                println!("{}", format::history_line(entry));
            }
        }
        HistoryAction::Remove(arg) => {
            rt.remove_from_history(arg.key()).await;
        }
        HistoryAction::Clear => {
            rt.clear_history().await;
            println!("History cleared.");
        }
        HistoryAction::Progress { title, percent } => {
            rt.set_progress(title.key(), percent).await?;
        }
    }
    Ok(())
}

pub fn config(action: &ConfigAction) -> Result<(), RuntimeError> {
    match action {
        ConfigAction::Path => println!("{}", AppConfig::config_path().display()),
        ConfigAction::Show => {
            let mut config = AppConfig::load()?;
            if config.has_api_key() {
                config.provider.api_key = "********".into();
            }
            print!("{}", config.to_toml()?);
        }
        ConfigAction::SetKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                return Err(RuntimeError::Invalid("API key must not be empty".into()));
            }
            let mut config = AppConfig::load_from(&AppConfig::config_path())?;
            config.provider.api_key = key.to_string();
            config.save()?;
            println!("API key saved to {}", AppConfig::config_path().display());
        }
    }
    Ok(())
}


use anyhow::{bail, Context};

use nevu_core::config::AppConfig;
use nevu_core::models::MediaItem;
use nevu_core::playback::PlayTarget;
use nevu_core::sort::sort_metadata;
use nevu_runtime::{clear_credentials, login, Credentials, Runtime, RuntimeError, StorageHandle};

use crate::args::{Cli, Commands, SessionCommand, SettingsAction, WatchlistAction};
use crate::output::{self, print_json};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let storage_path = AppConfig::ensure_storage_path()?;
    let storage = StorageHandle::open(&storage_path)
        .with_context(|| format!("failed to open {}", storage_path.display()))?;
    tracing::debug!(storage = %storage_path.display(), backend = config.backend_url(), "starting");

    match cli.command {
        Commands::Login {
            token,
            server,
            server_token,
        } => {
            let credentials = Credentials {
                account_token: token,
                server_url: server,
                server_token,
            };
            login(&storage, &credentials).await?;
            let rt = Runtime::new(config, storage).await?;
            match rt.session().load_user().await {
                Some(user) => println!("Logged in as {}", user.username),
                None => bail!("token was saved but plex.tv rejected it"),
            }
        }
        Commands::Logout => {
            match Runtime::new(config, storage.clone()).await {
                Ok(rt) => rt.logout().await?,
                Err(RuntimeError::NotLoggedIn) => {}
                Err(_) => clear_credentials(&storage).await?,
            }
            println!("Logged out");
        }
        Commands::Session(command) => {
            let rt = match Runtime::new(config, storage).await {
                Err(RuntimeError::NotLoggedIn) => {
                    bail!("not logged in; run `nevu login --token <TOKEN> --server <URL>`")
                }
                other => other?,
            };
            rt.start().await;
            dispatch(&rt, command, cli.json).await?;
        }
    }
    Ok(())
}

async fn dispatch(rt: &Runtime, command: SessionCommand, json: bool) -> anyhow::Result<()> {
    match command {
        SessionCommand::Whoami => {
            let Some(user) = rt.session().user().await else {
                bail!("could not load the plex.tv account");
            };
            if json {
                return print_json(&user);
            }
            println!("{} ({})", user.title, user.username);
            if let Some(email) = &user.email {
                println!("{email}");
            }
            println!("client {}", rt.identity().client_id);
        }

        SessionCommand::Libraries => {
            let libraries = rt.libraries().await?;
            if json {
                return print_json(&libraries);
            }
            for library in &libraries {
                println!("{}", output::library_line(library));
            }
        }

        SessionCommand::Home => {
            let (shelves, featured) = rt.home().await?;
            if json {
                return print_json(&serde_json::json!({
                    "featured": featured,
                    "shelves": shelves,
                }));
            }
            if let Some(item) = &featured {
                println!("Featured\n{}\n", output::item_detail(item));
            }
            for shelf in &shelves {
                println!("{}  ({})", shelf.title, shelf.dir);
            }
        }

        SessionCommand::Browse {
            section,
            filter,
            type_filter,
            sort,
        } => {
            let container = rt.browse(section, filter, type_filter, sort).await?;
            if json {
                return print_json(&container);
            }
            if let Some(title) = &container.title1 {
                println!("{title} ({} items)", container.metadata.len());
            }
            print_items(&container.metadata);
        }

        SessionCommand::Meta { rating_key } => {
            let item = rt.meta(&rating_key).await?;
            if json {
                return print_json(&item);
            }
            println!("{}", output::item_detail(&item));
            if let Some(url) = rt.trailer_url(&item) {
                println!("Trailer: {url}");
            }
        }

        SessionCommand::Play { rating_key } => {
            let item = rt.meta(&rating_key).await?;
            print_play_target(&rt.play_target(&item).await?, &item);
        }

        SessionCommand::Watchlist { action } => watchlist(rt, action, json).await?,

        SessionCommand::Settings { action } => settings(rt, action, json).await?,

        SessionCommand::Reviews { rating_key } => {
            let item = rt.meta(&rating_key).await?;
            let reviews = rt.reviews(&item).await?;
            if json {
                return print_json(&reviews);
            }
            print!("{}", output::reviews_text(&reviews));
        }

        SessionCommand::Mark { rating_key } => {
            let (item, played) = rt.toggle_watched(&rating_key).await?;
            match played {
                Some(true) => println!("Marked {} as watched", item.title),
                Some(false) => println!("Marked {} as unwatched", item.title),
                None => bail!("{} cannot be marked watched", item.item_type),
            }
        }

        SessionCommand::Rate { rating_key, stars } => {
            let stars = if stars == 0.0 {
                None
            } else if (0.5..=5.0).contains(&stars) {
                Some(stars)
            } else {
                bail!("stars must be between 0.5 and 5, or 0 to clear");
            };
            rt.rate(&rating_key, stars).await?;
            match stars {
                Some(s) => println!("Rated {s} stars"),
                None => println!("Rating cleared"),
            }
        }
    }
    Ok(())
}

async fn watchlist(rt: &Runtime, action: WatchlistAction, json: bool) -> anyhow::Result<()> {
    let cache = rt.watchlist();

    match action {
        WatchlistAction::List { sort } => {
            let mut items = cache.items().await;
            if let Some(sort) = sort {
                sort_metadata(&mut items, sort);
            }
            if json {
                return print_json(&items);
            }
            print_items(&items);
        }
        WatchlistAction::Add { rating_key } => {
            let item = rt.meta(&rating_key).await?;
            if cache.is_on_watchlist(&item.guid).await {
                println!("{} is already on the watchlist", item.title);
                return Ok(());
            }
            let guid = item.guid.clone();
            let title = item.title.clone();
            cache.add_item(item).await;
            if !cache.is_on_watchlist(&guid).await {
                bail!("could not add {title} to the watchlist");
            }
            println!("Added {title}");
        }
        WatchlistAction::Remove { rating_key } => {
            let item = rt.meta(&rating_key).await?;
            if !cache.is_on_watchlist(&item.guid).await {
                println!("{} is not on the watchlist", item.title);
                return Ok(());
            }
            cache.remove_item(&item.guid).await;
            if cache.is_on_watchlist(&item.guid).await {
                bail!("could not remove {} from the watchlist", item.title);
            }
            println!("Removed {}", item.title);
        }
        WatchlistAction::Open { position } => {
            let items = cache.items().await;
            let Some(entry) = position.checked_sub(1).and_then(|i| items.get(i)) else {
                bail!("watchlist has {} items", items.len());
            };
            let local = rt.resolve_local(entry).await?;
            print_play_target(&rt.play_target(&local).await?, &local);
        }
    }
    Ok(())
}

async fn settings(rt: &Runtime, action: SettingsAction, json: bool) -> anyhow::Result<()> {
    let store = rt.settings();

    match action {
        SettingsAction::List => {
            let snapshot = store.snapshot().await;
            if json {
                return print_json(&snapshot);
            }
            for (key, value) in &snapshot {
                println!("{key} = {value}");
            }
        }
        SettingsAction::Get { key } => match store.get(&key).await {
            Some(value) => println!("{value}"),
            None => bail!("unknown setting {key}"),
        },
        SettingsAction::Set { key, value } => {
            store.set_setting(&key, &value).await;
            println!("{key} = {value}");
        }
        SettingsAction::Toggle { key } => {
            let value = store.toggle(&key).await;
            println!("{key} = {value}");
        }
    }
    Ok(())
}

fn print_items(items: &[MediaItem]) {
    for item in items {
        println!("{}", output::item_line(item));
    }
}

fn print_play_target(target: &PlayTarget, item: &MediaItem) {
    match target.route() {
        Some(route) => println!("{route}"),
        None => println!("Nothing to play for {}", item.title),
    }
}

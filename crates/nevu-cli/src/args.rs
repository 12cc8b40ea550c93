use clap::{Parser, Subcommand};

use nevu_core::filter::{PrimaryFilter, TypeFilter};
use nevu_core::sort::LibrarySort;

#[derive(Parser, Debug)]
#[command(name = "nevu")]
#[command(author, version, about = "Browse a Plex server from the terminal", long_about = None)]
pub struct Cli {
    /// Debug logging for all nevu crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store an account token and server
    Login {
        /// plex.tv account token
        #[arg(long)]
        token: String,

        /// Server base URL, e.g. http://10.0.0.2:32400
        #[arg(long)]
        server: String,

        /// Server access token, if different from the account token
        #[arg(long)]
        server_token: Option<String>,
    },

    /// Forget stored tokens
    Logout,

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that run against a logged-in session.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show the logged-in account
    Whoami,

    /// List library sections
    Libraries,

    /// Genre shelves and a featured item
    Home,

    /// List a library section
    Browse {
        /// Section id
        section: u64,

        /// all, unwatched, watched, recentlyAdded, onDeck, newest
        #[arg(short, long)]
        filter: Option<PrimaryFilter>,

        /// any, movie, show, episode
        #[arg(short = 't', long = "type")]
        type_filter: Option<TypeFilter>,

        /// e.g. title:asc, year:desc, random:desc
        #[arg(short, long)]
        sort: Option<LibrarySort>,
    },

    /// Show metadata for an item
    Meta {
        rating_key: String,
    },

    /// Show what the play button starts for an item
    Play {
        rating_key: String,
    },

    /// Manage the plex.tv watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },

    /// Manage user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Community ratings and reviews for an item
    Reviews {
        rating_key: String,
    },

    /// Toggle watched state
    Mark {
        rating_key: String,
    },

    /// Rate an item in stars (0.5-5); 0 clears the rating
    Rate {
        rating_key: String,
        stars: f32,
    },
}

#[derive(Subcommand, Debug)]
pub enum WatchlistAction {
    /// List watchlist items
    List {
        #[arg(short, long)]
        sort: Option<LibrarySort>,
    },
    /// Add a server item by rating key
    Add { rating_key: String },
    /// Remove a server item by rating key
    Remove { rating_key: String },
    /// Find the Nth watchlist item (1-based) on the server and show how to play it
    Open { position: usize },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show all settings
    List,
    /// Show one setting
    Get { key: String },
    /// Set a setting
    Set { key: String, value: String },
    /// Flip a true/false setting
    Toggle { key: String },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_browse() {
        let cli = Cli::try_parse_from([
            "nevu", "browse", "2", "--filter", "unwatched", "--type", "show", "--sort", "year:desc",
        ])
        .unwrap();
        match cli.command {
            Commands::Session(SessionCommand::Browse {
                section,
                filter,
                type_filter,
                sort,
            }) => {
                assert_eq!(section, 2);
                assert_eq!(filter, Some(PrimaryFilter::Unwatched));
                assert_eq!(type_filter, Some(TypeFilter::Only(nevu_core::models::MediaType::Show)));
                assert_eq!(sort, Some(LibrarySort::YearDesc));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_session_commands_flatten() {
        let cli = Cli::try_parse_from(["nevu", "whoami"]).unwrap();
        assert!(matches!(cli.command, Commands::Session(SessionCommand::Whoami)));
        let cli = Cli::try_parse_from(["nevu", "logout", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Logout));
        assert!(cli.json);
    }

    #[test]
    fn test_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["nevu", "browse", "1", "--sort", "size:asc"]).is_err());
    }
}

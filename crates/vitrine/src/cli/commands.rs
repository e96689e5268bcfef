//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vitrine::{ImageFilter, OrderBy, Variant};

/// Vitrine - deduplicating image store with private and token-gated public access
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Deduplicating image store with private and token-gated public access", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./vitrine.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a fresh random token key
    Keygen,

    /// Apply pending database migrations
    Migrate,

    /// Upload an image file
    Upload {
        /// Acting user id
        #[arg(long)]
        user: i64,

        /// Path to the image file
        path: PathBuf,

        /// Keep the image private
        #[arg(long)]
        private: bool,
    },

    /// List a user's images
    List {
        /// Acting user id
        #[arg(long)]
        user: i64,

        /// Visibility filter
        #[arg(long, default_value = "all")]
        filter: FilterArg,

        /// Sort key
        #[arg(long, default_value = "updated-time")]
        order_by: OrderArg,

        /// Sort oldest first
        #[arg(long)]
        ascending: bool,

        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: i64,

        /// Page size
        #[arg(long, default_value = "10")]
        limit: i64,
    },

    /// Resolve one of the user's own images to a file
    Fetch {
        /// Acting user id
        #[arg(long)]
        user: i64,

        /// Image id
        image_id: i64,

        /// Which rendition to resolve
        #[arg(long, default_value = "compressed")]
        variant: VariantArg,
    },

    /// Resolve a public image from its file name and token
    Public {
        /// `{hash}.{ext}` file name
        file_name: String,

        /// Capability token from the public URL
        #[arg(long)]
        key: String,

        /// Which rendition to resolve
        #[arg(long, default_value = "compressed")]
        variant: VariantArg,
    },

    /// Make an image private or public
    Visibility {
        /// Acting user id
        #[arg(long)]
        user: i64,

        /// Image id
        image_id: i64,

        /// New visibility
        state: VisibilityArg,
    },

    /// Remove an image from the user's collection
    Delete {
        /// Acting user id
        #[arg(long)]
        user: i64,

        /// Image id
        image_id: i64,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

/// Visibility filter for `list`
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FilterArg {
    /// Every image
    All,
    /// Private images only
    Private,
    /// Public images only
    Public,
}

impl From<FilterArg> for ImageFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ImageFilter::All,
            FilterArg::Private => ImageFilter::Private,
            FilterArg::Public => ImageFilter::Public,
        }
    }
}

/// Sort key for `list`
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OrderArg {
    /// Upload time
    CreatedTime,
    /// Last visibility change
    UpdatedTime,
}

impl From<OrderArg> for OrderBy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::CreatedTime => OrderBy::CreatedTime,
            OrderArg::UpdatedTime => OrderBy::UpdatedTime,
        }
    }
}

/// Rendition for `fetch` and `public`
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VariantArg {
    /// The uploaded bytes
    Original,
    /// Bounded preview
    Thumbnail,
    /// Size-bounded rendition
    Compressed,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Original => Variant::Original,
            VariantArg::Thumbnail => Variant::Thumbnail,
            VariantArg::Compressed => Variant::Compressed,
        }
    }
}

/// Target visibility for `visibility`
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VisibilityArg {
    /// Owner only
    Private,
    /// Reachable through the public URL
    Public,
}

//! CLI commands

use anyhow::{Context as _, Result, bail};
use campus_client::types::{
    CreateFoodCategoryRequest, CreateFoodPlaceRequest, CreateHostelCategoryRequest,
    CreateHostelRequest, CreateSuggestionRequest, FoodCategory, FoodFilters, FoodPlace, Hostel,
    HostelCategory, HostelFilters, LoginRequest, PageLink, PageRequest, PageResponse, PriceRange,
    SignupRequest, Suggestion, SuggestionCategory, User, page_window,
};
use campus_client::{
    CampusClient, CampusClientBuilder, FilePart, Guard, ModerationQueue, Redirect,
};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::CliConfig;
use crate::session_file::FileSessionStore;

/// Everything a command needs to run
pub struct Context {
    client: CampusClient,
    json: bool,
}

impl Context {
    pub fn new(config: &CliConfig, data_dir: Option<&Path>, json: bool) -> Result<Self> {
        let store = FileSessionStore::open(config.session_path(data_dir));
        info!(path = %store.path().display(), "Using session file");

        let client = CampusClientBuilder::from_config(&config.client)
            .session_store(Arc::new(store))
            .build()?;
        Ok(Self { client, json })
    }

    fn require(&self, guard: Guard) -> Result<()> {
        match guard.check(&self.client.session()) {
            Ok(()) => Ok(()),
            Err(Redirect::Login) => bail!("{}: run `campus login` first", Redirect::Login),
            Err(redirect) => bail!("{redirect}"),
        }
    }

    /// Print `value` as JSON when requested, otherwise through `render`
    fn emit<T: Serialize>(&self, value: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account (pending until an admin approves it)
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Food places
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },

    /// Hostels
    Hostel {
        #[command(subcommand)]
        command: HostelCommands,
    },

    /// Suggestions for the directory maintainers
    Suggestion {
        #[command(subcommand)]
        command: SuggestionCommands,
    },

    /// Moderation console
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Args)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 12)]
    size: u32,

    /// Sort expression, e.g. `createdAt,desc`
    #[arg(long)]
    sort: Option<String>,
}

impl PageArgs {
    fn to_request(&self) -> PageRequest {
        PageRequest {
            page: Some(self.page.saturating_sub(1)),
            size: Some(self.size),
            sort: self.sort.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PriceArg {
    Budget,
    Moderate,
    Expensive,
}

impl From<PriceArg> for PriceRange {
    fn from(arg: PriceArg) -> Self {
        match arg {
            PriceArg::Budget => Self::Budget,
            PriceArg::Moderate => Self::Moderate,
            PriceArg::Expensive => Self::Expensive,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SuggestionArg {
    Food,
    Hostel,
    General,
}

impl From<SuggestionArg> for SuggestionCategory {
    fn from(arg: SuggestionArg) -> Self {
        match arg {
            SuggestionArg::Food => Self::Food,
            SuggestionArg::Hostel => Self::Hostel,
            SuggestionArg::General => Self::General,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum QueueArg {
    Users,
    Foods,
    FoodCategories,
    Hostels,
    HostelCategories,
}

impl From<QueueArg> for ModerationQueue {
    fn from(arg: QueueArg) -> Self {
        match arg {
            QueueArg::Users => Self::Users,
            QueueArg::Foods => Self::Foods,
            QueueArg::FoodCategories => Self::FoodCategories,
            QueueArg::Hostels => Self::Hostels,
            QueueArg::HostelCategories => Self::HostelCategories,
        }
    }
}

#[derive(Subcommand)]
pub enum FoodCommands {
    /// Browse approved food places
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// Price ranges, comma separated
        #[arg(long, value_delimiter = ',')]
        price: Vec<PriceArg>,
        /// Category ids, comma separated
        #[arg(long, value_delimiter = ',')]
        category: Vec<i64>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one food place
    Show { id: i64 },

    /// List approved food categories
    Categories,

    /// Submit a food place for review
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        locality: Option<String>,
        #[arg(long)]
        landmark: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        price: Option<PriceArg>,
        #[arg(long, value_delimiter = ',')]
        category: Vec<i64>,
        /// Propose a new category along with the place
        #[arg(long)]
        new_category: Option<String>,
    },

    /// Propose a new food category
    SuggestCategory { name: String },

    /// Upload images and print their URLs
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum HostelCommands {
    /// Browse approved hostels
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        rent_min: Option<f64>,
        #[arg(long)]
        rent_max: Option<f64>,
        #[arg(long)]
        wifi: bool,
        #[arg(long)]
        ac: bool,
        #[arg(long)]
        mess: bool,
        #[arg(long)]
        laundry: bool,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one hostel
    Show { id: i64 },

    /// List approved hostel categories
    Categories,

    /// Submit a hostel for review
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        rent_min: Option<f64>,
        #[arg(long)]
        rent_max: Option<f64>,
        #[arg(long)]
        wifi: bool,
        #[arg(long)]
        ac: bool,
        #[arg(long)]
        mess: bool,
        #[arg(long)]
        laundry: bool,
        #[arg(long)]
        contact_name: Option<String>,
        #[arg(long)]
        contact_phone: Option<String>,
        #[arg(long)]
        new_category: Option<String>,
    },

    /// Propose a new hostel category
    SuggestCategory { name: String },
}

#[derive(Subcommand)]
pub enum SuggestionCommands {
    /// Send a suggestion
    Send {
        #[arg(value_enum)]
        category: SuggestionArg,
        content: String,
    },

    /// List your own suggestions
    Mine,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Show moderation counters
    Stats,

    /// List items waiting for review
    Pending {
        #[arg(value_enum)]
        queue: QueueArg,
    },

    /// Approve an item
    Approve {
        #[arg(value_enum)]
        queue: QueueArg,
        id: i64,
    },

    /// Reject an item with a reason
    Reject {
        #[arg(value_enum)]
        queue: QueueArg,
        id: i64,
        #[arg(long)]
        reason: String,
    },

    /// Browse user suggestions
    Suggestions {
        #[arg(long, value_enum)]
        category: Option<SuggestionArg>,
        #[command(flatten)]
        page: PageArgs,
    },
}

impl Commands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let auth = ctx.client.login(&LoginRequest { email, password }).await?;
                println!("Signed in as {} <{}>", auth.user.username, auth.user.email);
                Ok(())
            }
            Self::Signup {
                email,
                phone,
                password,
            } => {
                ctx.client
                    .signup(&SignupRequest {
                        email,
                        phone,
                        password,
                    })
                    .await?;
                println!("Account created; it can be used once an admin approves it");
                Ok(())
            }
            Self::Logout => {
                // The local session is cleared even when the server call fails
                if let Err(e) = ctx.client.logout().await {
                    eprintln!("warning: server logout failed: {e}");
                }
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => {
                ctx.require(Guard::Authenticated)?;
                let user = ctx.client.current_user().await?;
                let role = if ctx.client.session().is_admin() {
                    "admin"
                } else {
                    "user"
                };
                ctx.emit(&user, |user| {
                    print_user(user);
                    println!("  role: {role}");
                })
            }
            Self::Food { command } => command.execute(ctx).await,
            Self::Hostel { command } => command.execute(ctx).await,
            Self::Suggestion { command } => command.execute(ctx).await,
            Self::Admin { command } => command.execute(ctx).await,
        }
    }
}

impl FoodCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::List {
                search,
                city,
                price,
                category,
                page,
            } => {
                let filters = FoodFilters {
                    search,
                    price_range: price.into_iter().map(Into::into).collect(),
                    category_ids: category,
                    city,
                };
                let places = ctx.client.food_places(&filters, &page.to_request()).await?;
                ctx.emit(&places, |places| print_page(places, print_food_place))
            }
            Self::Show { id } => {
                let place = ctx.client.food_place(id).await?;
                ctx.emit(&place, print_food_place_detail)
            }
            Self::Categories => {
                let categories = ctx.client.food_categories().await?;
                ctx.emit(&categories, |categories| {
                    categories.iter().for_each(print_food_category);
                })
            }
            Self::Submit {
                name,
                address,
                description,
                city,
                locality,
                landmark,
                contact,
                price,
                category,
                new_category,
            } => {
                ctx.require(Guard::Authenticated)?;
                let request = CreateFoodPlaceRequest {
                    place_name: name,
                    description,
                    address,
                    city,
                    locality,
                    landmark,
                    contact_info: contact,
                    price_range: price.map(Into::into),
                    category_ids: category,
                    suggested_category_name: new_category,
                    ..Default::default()
                };
                let place = ctx.client.create_food_place(&request).await?;
                println!("Submitted food place #{} for review", place.place_id);
                Ok(())
            }
            Self::SuggestCategory { name } => {
                ctx.require(Guard::Authenticated)?;
                let category = ctx
                    .client
                    .create_food_category(&CreateFoodCategoryRequest {
                        category_name: name,
                    })
                    .await?;
                println!("Proposed food category #{}", category.category_id);
                Ok(())
            }
            Self::Upload { files } => {
                ctx.require(Guard::Authenticated)?;
                let parts = files
                    .iter()
                    .map(|path| read_file_part(path))
                    .collect::<Result<Vec<_>>>()?;
                let urls = ctx.client.upload_food_images(parts).await?;
                ctx.emit(&urls, |urls| urls.iter().for_each(|url| println!("{url}")))
            }
        }
    }
}

impl HostelCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::List {
                search,
                city,
                rent_min,
                rent_max,
                wifi,
                ac,
                mess,
                laundry,
                page,
            } => {
                let filters = HostelFilters {
                    search,
                    rent_min,
                    rent_max,
                    has_wifi: wifi.then_some(true),
                    has_ac: ac.then_some(true),
                    has_mess: mess.then_some(true),
                    has_laundry: laundry.then_some(true),
                    city,
                };
                let hostels = ctx.client.hostels(&filters, &page.to_request()).await?;
                ctx.emit(&hostels, |hostels| print_page(hostels, print_hostel))
            }
            Self::Show { id } => {
                let hostel = ctx.client.hostel(id).await?;
                ctx.emit(&hostel, print_hostel_detail)
            }
            Self::Categories => {
                let categories = ctx.client.hostel_categories().await?;
                ctx.emit(&categories, |categories| {
                    categories.iter().for_each(print_hostel_category);
                })
            }
            Self::Submit {
                name,
                address,
                description,
                city,
                rent_min,
                rent_max,
                wifi,
                ac,
                mess,
                laundry,
                contact_name,
                contact_phone,
                new_category,
            } => {
                ctx.require(Guard::Authenticated)?;
                let request = CreateHostelRequest {
                    hostel_name: name,
                    description,
                    address,
                    city,
                    monthly_rent_min: rent_min,
                    monthly_rent_max: rent_max,
                    has_wifi: Some(wifi),
                    has_ac: Some(ac),
                    has_mess: Some(mess),
                    has_laundry: Some(laundry),
                    contact_person_name: contact_name,
                    contact_person_phone: contact_phone,
                    suggested_category_name: new_category,
                    ..Default::default()
                };
                let hostel = ctx.client.create_hostel(&request).await?;
                println!("Submitted hostel #{} for review", hostel.hostel_id);
                Ok(())
            }
            Self::SuggestCategory { name } => {
                ctx.require(Guard::Authenticated)?;
                let category = ctx
                    .client
                    .create_hostel_category(&CreateHostelCategoryRequest {
                        category_name: name,
                    })
                    .await?;
                println!("Proposed hostel category #{}", category.category_id);
                Ok(())
            }
        }
    }
}

impl SuggestionCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.require(Guard::Authenticated)?;
        match self {
            Self::Send { category, content } => {
                let suggestion = ctx
                    .client
                    .create_suggestion(&CreateSuggestionRequest {
                        category: category.into(),
                        content,
                    })
                    .await?;
                println!("Thanks! Suggestion #{} recorded", suggestion.suggestion_id);
                Ok(())
            }
            Self::Mine => {
                let suggestions = ctx.client.my_suggestions().await?;
                ctx.emit(&suggestions, |suggestions| {
                    suggestions.iter().for_each(print_suggestion);
                })
            }
        }
    }
}

impl AdminCommands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.require(Guard::Admin)?;
        match self {
            Self::Stats => {
                let stats = ctx.client.dashboard_stats().await?;
                ctx.emit(&stats, |stats| {
                    println!("Pending users:             {}", stats.pending_users);
                    println!("Pending food places:       {}", stats.pending_food);
                    println!("Pending food categories:   {}", stats.pending_food_categories);
                    println!("Pending hostels:           {}", stats.pending_hostels);
                    println!("Pending hostel categories: {}", stats.pending_hostel_categories);
                    println!("Suggestions:               {}", stats.total_suggestions);
                })
            }
            Self::Pending { queue } => match ModerationQueue::from(queue) {
                ModerationQueue::Users => {
                    let users = ctx.client.pending_users().await?;
                    ctx.emit(&users, |users| users.iter().for_each(print_user))
                }
                ModerationQueue::Foods => {
                    let places = ctx.client.pending_food().await?;
                    ctx.emit(&places, |places| places.iter().for_each(print_food_place))
                }
                ModerationQueue::FoodCategories => {
                    let categories = ctx.client.pending_food_categories().await?;
                    ctx.emit(&categories, |categories| {
                        categories.iter().for_each(print_food_category);
                    })
                }
                ModerationQueue::Hostels => {
                    let hostels = ctx.client.pending_hostels().await?;
                    ctx.emit(&hostels, |hostels| hostels.iter().for_each(print_hostel))
                }
                ModerationQueue::HostelCategories => {
                    let categories = ctx.client.pending_hostel_categories().await?;
                    ctx.emit(&categories, |categories| {
                        categories.iter().for_each(print_hostel_category);
                    })
                }
            },
            Self::Approve { queue, id } => {
                let queue = ModerationQueue::from(queue);
                ctx.client.approve(queue, id).await?;
                println!("Approved {queue} #{id}");
                Ok(())
            }
            Self::Reject { queue, id, reason } => {
                if reason.trim().is_empty() {
                    bail!("a rejection reason is required");
                }
                let queue = ModerationQueue::from(queue);
                ctx.client.reject(queue, id, &reason).await?;
                println!("Rejected {queue} #{id}");
                Ok(())
            }
            Self::Suggestions { category, page } => match category {
                Some(category) => {
                    let suggestions = ctx.client.suggestions_by_category(category.into()).await?;
                    ctx.emit(&suggestions, |suggestions| {
                        suggestions.iter().for_each(print_suggestion);
                    })
                }
                None => {
                    let suggestions = ctx.client.suggestions(&page.to_request()).await?;
                    ctx.emit(&suggestions, |suggestions| {
                        print_page(suggestions, print_suggestion);
                    })
                }
            },
        }
    }
}

fn read_file_part(path: &Path) -> Result<FilePart> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(FilePart {
        field: "images".to_string(),
        mime: mime_for(path).to_string(),
        file_name,
        bytes,
    })
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn print_page<T>(page: &PageResponse<T>, print_item: impl Fn(&T)) {
    if page.content.is_empty() {
        println!("Nothing found");
        return;
    }
    page.content.iter().for_each(print_item);

    let current = page.number + 1;
    let links = page_window(current, page.total_pages)
        .iter()
        .map(|link| match link {
            PageLink::Page(n) if *n == current => format!("[{n}]"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>();
    println!(
        "\n{} result(s), page {current} of {}  {}",
        page.total_elements,
        page.total_pages,
        links.join(" ")
    );
}

fn print_user(user: &User) {
    println!(
        "#{:<5} {:<20} {:<30} {:?}",
        user.user_id, user.username, user.email, user.account_status
    );
}

fn print_food_place(place: &FoodPlace) {
    let price = place.price_range.map_or("-", PriceRange::as_str);
    println!(
        "#{:<5} {:<30} {:<10} {:.1}★  {}",
        place.place_id, place.place_name, price, place.average_rating, place.address
    );
}

fn print_food_place_detail(place: &FoodPlace) {
    println!("{} (#{})", place.place_name, place.place_id);
    println!("  address:  {}", place.address);
    if let Some(description) = &place.description {
        println!("  about:    {description}");
    }
    if let Some(price) = place.price_range {
        println!("  price:    {}", price.as_str());
    }
    if let Some(contact) = &place.contact_info {
        println!("  contact:  {contact}");
    }
    if !place.categories.is_empty() {
        let names = place
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect::<Vec<_>>();
        println!("  serves:   {}", names.join(", "));
    }
    println!("  rating:   {:.1}", place.average_rating);
    for url in &place.image_urls {
        println!("  image:    {url}");
    }
}

fn print_food_category(category: &FoodCategory) {
    println!(
        "#{:<5} {:<30} {:?}",
        category.category_id, category.category_name, category.status
    );
}

fn print_hostel(hostel: &Hostel) {
    let rent = match (hostel.monthly_rent_min, hostel.monthly_rent_max) {
        (Some(min), Some(max)) => format!("{min:.0}-{max:.0}"),
        (Some(rent), None) | (None, Some(rent)) => format!("{rent:.0}"),
        (None, None) => "-".to_string(),
    };
    println!(
        "#{:<5} {:<30} {:<12} {}",
        hostel.hostel_id, hostel.hostel_name, rent, hostel.address
    );
}

fn print_hostel_detail(hostel: &Hostel) {
    println!("{} (#{})", hostel.hostel_name, hostel.hostel_id);
    println!("  address:  {}", hostel.address);
    if let Some(description) = &hostel.description {
        println!("  about:    {description}");
    }
    if let Some(distance) = &hostel.distance_from_cdac {
        println!("  distance: {distance}");
    }
    let amenities = [
        ("wifi", hostel.has_wifi),
        ("ac", hostel.has_ac),
        ("mess", hostel.has_mess),
        ("laundry", hostel.has_laundry),
    ]
    .into_iter()
    .filter_map(|(name, present)| (present == Some(true)).then_some(name))
    .collect::<Vec<_>>();
    if !amenities.is_empty() {
        println!("  offers:   {}", amenities.join(", "));
    }
    if let Some(name) = &hostel.contact_person_name {
        let phone = hostel.contact_person_phone.as_deref().unwrap_or("-");
        println!("  contact:  {name} ({phone})");
    }
}

fn print_hostel_category(category: &HostelCategory) {
    println!(
        "#{:<5} {:<30} {:?}",
        category.category_id, category.category_name, category.status
    );
}

fn print_suggestion(suggestion: &Suggestion) {
    println!(
        "#{:<5} {:<8} {}",
        suggestion.suggestion_id, suggestion.category, suggestion.content
    );
}

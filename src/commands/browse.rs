use super::{
    ExecutableCommand, OutputFormat,
    output::{Tabular, print_many},
};
use crate::{
    Error, Result, State,
    model::{Client, Goal},
    pagination::{PAGE_SIZES, PaginationInfo},
    resources::{Browsable, ClientsResource, GoalsResource, Page},
    search::{FilterState, SortOrder, debounce},
    transport::HttpTransport,
};
use clap::Subcommand;
use log::debug;
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

const HELP: &str = "\
Type to search. Commands:
  :next, :prev, :page N     move between pages
  :limit N                  entries per page (5, 10, 20 or 50)
  :sort FIELD [asc|desc]    sort; repeating a field flips the order
  :refresh                  fetch the list again
  :clear                    drop the search and sort
  :help, :quit";

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum BrowseCommands {
    /// Browse clients.
    Clients,
    /// Browse goals.
    Goals,
}

impl ExecutableCommand for BrowseCommands {
    async fn execute(self, state: &mut State) -> Result<()> {
        let api = state.api();
        match self {
            Self::Clients => browse(&mut ClientsResource::new(api), state).await,
            Self::Goals => browse(&mut GoalsResource::new(api), state).await,
        }
    }
}

/// A list that can be browsed a page at a time.
#[allow(async_fn_in_trait)]
trait Listing {
    type Item: Browsable + Serialize + Tabular;

    async fn refresh(&mut self) -> Result<()>;

    fn page(&self, filter: &FilterState, page: u64, limit: u64) -> Page<Self::Item>;
}

impl Listing for ClientsResource<'_, HttpTransport> {
    type Item = Client;

    async fn refresh(&mut self) -> Result<()> {
        match self.refetch().await.error() {
            Some(error) => Err(Error::simple(error)),
            None => Ok(()),
        }
    }

    fn page(&self, filter: &FilterState, page: u64, limit: u64) -> Page<Client> {
        self.view(filter, page, limit)
    }
}

impl Listing for GoalsResource<'_, HttpTransport> {
    type Item = Goal;

    async fn refresh(&mut self) -> Result<()> {
        match self.refetch().await.error() {
            Some(error) => Err(Error::simple(error)),
            None => Ok(()),
        }
    }

    fn page(&self, filter: &FilterState, page: u64, limit: u64) -> Page<Goal> {
        self.view(filter, page, limit)
    }
}

/// One line of input in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseInput {
    Search(String),
    Next,
    Prev,
    Page(u64),
    Limit(u64),
    Sort(String, Option<SortOrder>),
    Refresh,
    Clear,
    Help,
    Quit,
}

impl BrowseInput {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Ok(Self::Search(String::from(line)));
        };
        let mut words = command.split_whitespace();
        let input = match words.next().unwrap_or_default() {
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Prev,
            "page" => Self::Page(number(words.next())?),
            "limit" => {
                let limit = number(words.next())?;
                if !PAGE_SIZES.contains(&limit) {
                    return Err(format!("Page size must be one of {PAGE_SIZES:?}"));
                }
                Self::Limit(limit)
            }
            "sort" => {
                let field = words.next().ok_or("Which field?")?;
                let order = words
                    .next()
                    .map(|o| o.parse().map_err(|_| format!("`{o}` is not asc or desc")))
                    .transpose()?;
                Self::Sort(String::from(field), order)
            }
            "r" | "refresh" => Self::Refresh,
            "c" | "clear" => Self::Clear,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command `:{other}`; try :help")),
        };
        Ok(input)
    }
}

fn number(word: Option<&str>) -> std::result::Result<u64, String> {
    let word = word.ok_or("A number is needed")?;
    word.parse().map_err(|_| format!("`{word}` is not a number"))
}

/// Where the user is in the list: search, sort and page.
#[derive(Debug, Clone, PartialEq)]
struct Browser {
    filter: FilterState,
    page: u64,
    limit: u64,
    sort_fields: &'static [&'static str],
}

impl Browser {
    fn new(limit: u64, sort_fields: &'static [&'static str]) -> Self {
        Self {
            filter: FilterState::default(),
            page: 1,
            limit: limit.max(1),
            sort_fields,
        }
    }

    /// Applies everything except refresh, help and quit, which the loop handles.
    fn apply(&mut self, input: BrowseInput) -> std::result::Result<(), String> {
        match input {
            BrowseInput::Search(text) => {
                if text != self.filter.search {
                    self.filter.search = text;
                    self.page = 1;
                }
            }
            BrowseInput::Next => self.page += 1,
            BrowseInput::Prev => self.page = self.page.saturating_sub(1).max(1),
            BrowseInput::Page(page) => self.page = page.max(1),
            BrowseInput::Limit(limit) => {
                self.limit = limit;
                self.page = 1;
            }
            BrowseInput::Sort(field, order) => {
                if !self.sort_fields.contains(&field.as_str()) {
                    return Err(format!(
                        "Can only sort by {}",
                        self.sort_fields.join(", ")
                    ));
                }
                let order = order.unwrap_or_else(|| {
                    match (self.filter.sort_by.as_deref(), self.filter.sort_order) {
                        (Some(current), Some(order)) if current == field => order.toggled(),
                        _ => SortOrder::Asc,
                    }
                });
                self.filter.sort_by = Some(field);
                self.filter.sort_order = Some(order);
            }
            BrowseInput::Clear => {
                self.filter.clear();
                self.page = 1;
            }
            BrowseInput::Refresh | BrowseInput::Help | BrowseInput::Quit => {}
        }
        Ok(())
    }

    /// Keeps the page in range once the list has been sliced.
    fn sync(&mut self, pagination: &PaginationInfo) {
        self.page = pagination.page;
    }
}

fn render<L: Listing>(listing: &L, browser: &mut Browser) -> Result<()> {
    let page = listing.page(&browser.filter, browser.page, browser.limit);
    browser.sync(&page.pagination);
    print_many(&page.items, OutputFormat::Table)?;
    let filter = &browser.filter;
    if filter.has_active_filters() {
        let sort = match (&filter.sort_by, filter.sort_order) {
            (Some(field), order) => format!(", sorted by {field} {}", order.unwrap_or_default()),
            (None, _) => String::new(),
        };
        println!("Searching for {:?}{sort}", filter.search);
    }
    println!("{}", page.pagination);
    Ok(())
}

async fn browse<L: Listing>(listing: &mut L, state: &State) -> Result<()> {
    listing.refresh().await?;
    let sort_fields = <L::Item as Browsable>::SORT_FIELDS;
    let mut browser = Browser::new(state.config().page_size(), sort_fields);
    let (search_tx, search_rx) = mpsc::channel(16);
    let mut searches = debounce(search_rx, state.config().debounce());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    render(listing, &mut browser)?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match BrowseInput::parse(&line) {
                    Ok(BrowseInput::Quit) => break,
                    Ok(BrowseInput::Help) => println!("{HELP}"),
                    Ok(BrowseInput::Search(text)) => {
                        if search_tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(BrowseInput::Refresh) => {
                        listing.refresh().await?;
                        render(listing, &mut browser)?;
                    }
                    Ok(input) => match browser.apply(input) {
                        Ok(()) => render(listing, &mut browser)?,
                        Err(message) => println!("{message}"),
                    },
                    Err(message) => println!("{message}"),
                }
            }
            Some(text) = searches.recv() => {
                debug!("Searching for {text:?}");
                if browser.apply(BrowseInput::Search(text)).is_ok() {
                    render(listing, &mut browser)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn browser() -> Browser {
        Browser::new(10, Client::SORT_FIELDS)
    }

    #[test]
    fn plain_text_is_a_search() {
        assert_eq!(
            BrowseInput::parse("  ada  ").unwrap(),
            BrowseInput::Search("ada".into())
        );
        assert_eq!(BrowseInput::parse("").unwrap(), BrowseInput::Search(String::new()));
    }

    #[test]
    fn commands_parse() {
        assert_eq!(BrowseInput::parse(":next").unwrap(), BrowseInput::Next);
        assert_eq!(BrowseInput::parse(":page 3").unwrap(), BrowseInput::Page(3));
        assert_eq!(BrowseInput::parse(":limit 20").unwrap(), BrowseInput::Limit(20));
        assert_eq!(
            BrowseInput::parse(":sort name desc").unwrap(),
            BrowseInput::Sort("name".into(), Some(SortOrder::Desc))
        );
        assert_eq!(
            BrowseInput::parse(":sort email").unwrap(),
            BrowseInput::Sort("email".into(), None)
        );
        assert_eq!(BrowseInput::parse(":q").unwrap(), BrowseInput::Quit);
    }

    #[test]
    fn bad_commands_are_rejected() {
        assert!(BrowseInput::parse(":limit 7").is_err());
        assert!(BrowseInput::parse(":page two").is_err());
        assert!(BrowseInput::parse(":sort").is_err());
        assert!(BrowseInput::parse(":sort name sideways").is_err());
        assert!(BrowseInput::parse(":launch").is_err());
    }

    #[test]
    fn new_search_or_limit_goes_back_to_the_first_page() {
        let mut b = browser();
        b.apply(BrowseInput::Page(3)).unwrap();
        b.apply(BrowseInput::Search("ada".into())).unwrap();
        assert_eq!(b.page, 1);
        b.apply(BrowseInput::Next).unwrap();
        b.apply(BrowseInput::Search("ada".into())).unwrap();
        assert_eq!(b.page, 2);
        b.apply(BrowseInput::Limit(50)).unwrap();
        assert_eq!((b.page, b.limit), (1, 50));
    }

    #[test]
    fn prev_stops_at_the_first_page() {
        let mut b = browser();
        b.apply(BrowseInput::Prev).unwrap();
        assert_eq!(b.page, 1);
    }

    #[test]
    fn sorting_the_same_field_again_flips_the_order() {
        let mut b = browser();
        b.apply(BrowseInput::Sort("name".into(), None)).unwrap();
        assert_eq!(b.filter.sort_order, Some(SortOrder::Asc));
        b.apply(BrowseInput::Sort("name".into(), None)).unwrap();
        assert_eq!(b.filter.sort_order, Some(SortOrder::Desc));
        b.apply(BrowseInput::Sort("email".into(), None)).unwrap();
        assert_eq!(b.filter.sort_order, Some(SortOrder::Asc));
        assert!(b.apply(BrowseInput::Sort("phone".into(), None)).is_err());
        assert_eq!(b.filter.sort_by.as_deref(), Some("email"));
    }

    #[test]
    fn clear_drops_search_and_sort() {
        let mut b = browser();
        b.apply(BrowseInput::Search("x".into())).unwrap();
        b.apply(BrowseInput::Sort("id".into(), Some(SortOrder::Desc))).unwrap();
        b.apply(BrowseInput::Clear).unwrap();
        assert!(!b.filter.has_active_filters());
    }

    #[test]
    fn sync_clamps_the_page() {
        let mut b = browser();
        b.apply(BrowseInput::Page(9)).unwrap();
        b.sync(&PaginationInfo::new(b.page, b.limit, 25));
        assert_eq!(b.page, 3);
    }
}

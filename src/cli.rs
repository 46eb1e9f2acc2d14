use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use bikeshare_explorer::data::filter::{filter, FilteredView};
use bikeshare_explorer::data::loader::{load_with, LoadOptions, MalformedRowPolicy};
use bikeshare_explorer::data::model::{City, CityDataset, DayFilter, MonthFilter, Selection};
use bikeshare_explorer::data::pager::{RawDataCursor, PAGE_SIZE};
use bikeshare_explorer::data::source::DirectorySource;
use bikeshare_explorer::data::stats::Summary;
use bikeshare_explorer::report::{render_json, render_page, render_summary, selection_banner};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Explore US bike-share trip data for Chicago, New York City and Washington.
///
/// Without --city the tool asks for the city, month and day interactively.
#[derive(Debug, Parser)]
#[command(name = "bikeshare-explorer", version, about)]
pub struct Args {
    /// Directory holding chicago, new_york_city and washington trip files
    /// (.csv, .parquet or .json).
    #[arg(long, env = "BIKESHARE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// City to analyse; skips the prompts.
    #[arg(long)]
    pub city: Option<String>,

    /// Month filter (January to June, or all). Used with --city.
    #[arg(long, default_value = "all")]
    pub month: String,

    /// Day filter (Monday to Sunday, or all). Used with --city.
    #[arg(long, default_value = "all")]
    pub day: String,

    /// Print the statistics as JSON.
    #[arg(long)]
    pub json: bool,

    /// Raw-data pages to print without prompting. Used with --city.
    #[arg(long, default_value_t = 0)]
    pub raw_pages: usize,

    /// Invalid answers allowed per prompt before the session ends.
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Drop rows with unparsable fields instead of failing the load.
    #[arg(long)]
    pub skip_malformed: bool,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            on_malformed: if self.skip_malformed {
                MalformedRowPolicy::Skip
            } else {
                MalformedRowPolicy::Abort
            },
        }
    }
}

pub fn run(args: &Args) -> Result<()> {
    let mut session = Session::new(args);
    match &args.city {
        Some(city) => {
            let selection = Selection {
                city: city.parse()?,
                month: args.month.parse()?,
                day: args.day.parse()?,
            };
            session.run_batch(selection)
        }
        None => session.run_interactive(),
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Loaded datasets are kept for the whole session so a restart on the same
/// city does not re-read its file.
struct Session<'a> {
    args: &'a Args,
    source: DirectorySource,
    datasets: HashMap<City, CityDataset>,
    theme: ColorfulTheme,
}

impl<'a> Session<'a> {
    fn new(args: &'a Args) -> Self {
        Session {
            args,
            source: DirectorySource::new(&args.data_dir),
            datasets: HashMap::new(),
            theme: ColorfulTheme::default(),
        }
    }

    fn run_batch(&mut self, selection: Selection) -> Result<()> {
        let dataset = cached(&mut self.datasets, &self.source, selection.city, self.args)?;
        let view = filter(dataset, selection.month, selection.day);
        print_statistics(&selection, &view, self.args.json)?;

        let mut cursor = RawDataCursor::new(&view);
        for _ in 0..self.args.raw_pages {
            if !cursor.has_more() {
                break;
            }
            println!("{}", render_page(&cursor.next_page(), view.schema())?);
        }
        Ok(())
    }

    fn run_interactive(&mut self) -> Result<()> {
        println!("Hello! Let's explore some US bikeshare data!");
        loop {
            let Some(selection) = self.ask_selection()? else {
                println!("\nYou exceeded the maximum number of attempts. Please run the program again.");
                return Ok(());
            };
            println!("{RULE}");

            let dataset = cached(&mut self.datasets, &self.source, selection.city, self.args)?;
            let view = filter(dataset, selection.month, selection.day);
            print_statistics(&selection, &view, self.args.json)?;
            browse_raw_data(&view, &self.theme)?;

            let restart = Confirm::with_theme(&self.theme)
                .with_prompt("Would you like to restart?")
                .default(false)
                .interact()?;
            if !restart {
                return Ok(());
            }
        }
    }

    fn ask_selection(&self) -> Result<Option<Selection>> {
        let Some(city) = self.ask::<City>("Which city? (Chicago, New York City, Washington)")? else {
            return Ok(None);
        };
        let Some(month) = self.ask::<MonthFilter>("Which month? (January to June, or all)")? else {
            return Ok(None);
        };
        let Some(day) = self.ask::<DayFilter>("Which day? (Monday to Sunday, or all)")? else {
            return Ok(None);
        };
        Ok(Some(Selection { city, month, day }))
    }

    /// Prompt until the answer parses, giving up after `max_attempts`.
    fn ask<T>(&self, prompt: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = bikeshare_explorer::Error>,
    {
        for attempt in 1..=self.args.max_attempts {
            let answer = Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .interact_text()?;
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(err) => {
                    log::debug!("rejected answer {attempt}/{}: {err}", self.args.max_attempts);
                    eprintln!("Please check your input: {err}");
                }
            }
        }
        Ok(None)
    }
}

const RULE: &str = "----------------------------------------";

/// Load a city on first use and keep it for the rest of the session.
fn cached<'c>(
    cache: &'c mut HashMap<City, CityDataset>,
    source: &DirectorySource,
    city: City,
    args: &Args,
) -> Result<&'c CityDataset> {
    match cache.entry(city) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let dataset = load_with(source, city, args.load_options())
                .with_context(|| format!("loading {city} trips from {}", source.root().display()))?;
            Ok(entry.insert(dataset))
        }
    }
}

fn print_statistics(selection: &Selection, view: &FilteredView<'_>, json: bool) -> Result<()> {
    let summary = Summary::compute(view);
    if json {
        println!("{}", render_json(&summary)?);
    } else {
        println!("{}", selection_banner(selection, view.len()));
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

fn browse_raw_data(view: &FilteredView<'_>, theme: &ColorfulTheme) -> Result<()> {
    let mut cursor = RawDataCursor::new(view);
    let mut prompt = format!("Would you like to view {PAGE_SIZE} rows of the trip data?");
    while cursor.has_more() {
        let more = Confirm::with_theme(theme)
            .with_prompt(&prompt)
            .default(false)
            .interact()?;
        if !more {
            return Ok(());
        }
        println!("{}", render_page(&cursor.next_page(), view.schema())?);
        prompt = format!("Would you like to view {PAGE_SIZE} more rows?");
    }
    println!("No more rows to display.");
    Ok(())
}

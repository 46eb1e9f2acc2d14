use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::{Parser, ValueEnum};
use parquet::arrow::ArrowWriter;

use bikeshare_explorer::data::loader::{
    BIRTH_YEAR, END_STATION, END_TIME, GENDER, START_STATION, START_TIME, TRIP_DURATION, USER_TYPE,
};
use bikeshare_explorer::data::model::City;

/// Write synthetic trip files for every supported city.
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Trips per city.
    #[arg(long, default_value_t = 2_000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `0..n`.
    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Index drawn with the given relative weights.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut pick = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                return i;
            }
            pick -= w;
        }
        weights.len() - 1
    }
}

fn stations(city: City) -> &'static [&'static str] {
    match city {
        City::Chicago => &[
            "Streeter Dr & Grand Ave",
            "Lake Shore Dr & Monroe St",
            "Clinton St & Washington Blvd",
            "Canal St & Adams St",
            "Michigan Ave & Oak St",
        ],
        City::NewYorkCity => &[
            "Pershing Square North",
            "E 17 St & Broadway",
            "W 21 St & 6 Ave",
            "Broadway & E 22 St",
            "West St & Chambers St",
        ],
        City::Washington => &[
            "Columbus Circle / Union Station",
            "Lincoln Memorial",
            "Jefferson Dr & 14th St SW",
            "Massachusetts Ave & Dupont Circle NW",
            "15th & P St NW",
        ],
    }
}

/// Hours weighted towards the commuting peaks.
const HOUR_WEIGHTS: [f64; 24] = [
    0.3, 0.2, 0.1, 0.1, 0.2, 0.6, 1.5, 3.0, 4.5, 2.5, 1.8, 2.0, 2.3, 2.2, 2.0, 2.4, 3.2, 5.0,
    4.2, 2.8, 1.8, 1.2, 0.8, 0.5,
];

/// Later months busier, as in the published data.
const MONTH_WEIGHTS: [f64; 6] = [0.6, 0.7, 0.9, 1.2, 1.6, 2.0];

struct Columns {
    start: Vec<String>,
    end: Vec<String>,
    duration: Vec<f64>,
    start_station: Vec<String>,
    end_station: Vec<String>,
    user_type: Vec<Option<String>>,
    gender: Vec<Option<String>>,
    birth_year: Vec<Option<i64>>,
}

fn generate(city: City, rows: usize, rng: &mut SimpleRng) -> Result<Columns> {
    let names = stations(city);
    let mut cols = Columns {
        start: Vec::with_capacity(rows),
        end: Vec::with_capacity(rows),
        duration: Vec::with_capacity(rows),
        start_station: Vec::with_capacity(rows),
        end_station: Vec::with_capacity(rows),
        user_type: Vec::with_capacity(rows),
        gender: Vec::with_capacity(rows),
        birth_year: Vec::with_capacity(rows),
    };

    for _ in 0..rows {
        let month = rng.weighted(&MONTH_WEIGHTS) as u32 + 1;
        let day = rng.below(28) as u32 + 1;
        let hour = rng.weighted(&HOUR_WEIGHTS) as u32;
        let start: NaiveDateTime = NaiveDate::from_ymd_opt(2017, month, day)
            .and_then(|d| d.and_hms_opt(hour, rng.below(60) as u32, rng.below(60) as u32))
            .context("generated an invalid start time")?;
        // 2 to ~60 minutes, skewed short.
        let seconds = 120 + (rng.next_f64().powi(2) * 3_480.0) as i64;
        let end = start + Duration::seconds(seconds);

        let from = rng.below(names.len());
        let to = (from + 1 + rng.below(names.len() - 1)) % names.len();
        let subscriber = rng.next_f64() < 0.8;

        cols.start.push(start.format("%Y-%m-%d %H:%M:%S").to_string());
        cols.end.push(end.format("%Y-%m-%d %H:%M:%S").to_string());
        cols.duration.push(seconds as f64);
        cols.start_station.push(names[from].to_string());
        cols.end_station.push(names[to].to_string());
        cols.user_type.push(Some(
            if subscriber { "Subscriber" } else { "Customer" }.to_string(),
        ));
        // Customers rarely report demographics.
        if subscriber {
            let gender = if rng.next_f64() < 0.7 { "Male" } else { "Female" };
            cols.gender.push(Some(gender.to_string()));
            cols.birth_year.push(Some(1950 + rng.below(50) as i64));
        } else {
            cols.gender.push(None);
            cols.birth_year.push(None);
        }
    }
    Ok(cols)
}

fn has_demographics(city: City) -> bool {
    city != City::Washington
}

fn write_csv(path: &Path, city: City, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    let mut header = vec![
        "", START_TIME, END_TIME, TRIP_DURATION, START_STATION, END_STATION, USER_TYPE,
    ];
    if has_demographics(city) {
        header.extend([GENDER, BIRTH_YEAR]);
    }
    writer.write_record(&header)?;

    for i in 0..cols.start.len() {
        let mut record = vec![
            i.to_string(),
            cols.start[i].clone(),
            cols.end[i].clone(),
            format!("{:.1}", cols.duration[i]),
            cols.start_station[i].clone(),
            cols.end_station[i].clone(),
            cols.user_type[i].clone().unwrap_or_default(),
        ];
        if has_demographics(city) {
            record.push(cols.gender[i].clone().unwrap_or_default());
            // Birth years are written as floats, like the published files.
            record.push(cols.birth_year[i].map(|y| format!("{y}.0")).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, city: City, cols: &Columns) -> Result<()> {
    let mut fields = vec![
        Field::new(START_TIME, DataType::Utf8, false),
        Field::new(END_TIME, DataType::Utf8, false),
        Field::new(TRIP_DURATION, DataType::Float64, false),
        Field::new(START_STATION, DataType::Utf8, false),
        Field::new(END_STATION, DataType::Utf8, false),
        Field::new(USER_TYPE, DataType::Utf8, true),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(&cols.start)),
        Arc::new(StringArray::from_iter_values(&cols.end)),
        Arc::new(Float64Array::from(cols.duration.clone())),
        Arc::new(StringArray::from_iter_values(&cols.start_station)),
        Arc::new(StringArray::from_iter_values(&cols.end_station)),
        Arc::new(StringArray::from_iter(cols.user_type.iter().map(|v| v.as_deref()))),
    ];
    if has_demographics(city) {
        fields.push(Field::new(GENDER, DataType::Utf8, true));
        fields.push(Field::new(BIRTH_YEAR, DataType::Int64, true));
        arrays.push(Arc::new(StringArray::from_iter(cols.gender.iter().map(|v| v.as_deref()))));
        arrays.push(Arc::new(Int64Array::from(cols.birth_year.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    for city in City::ALL {
        let cols = generate(city, args.rows, &mut rng)?;
        let ext = match args.format {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
        };
        let path = args.out.join(format!("{}.{ext}", city.file_stem()));
        match args.format {
            Format::Csv => write_csv(&path, city, &cols)?,
            Format::Parquet => write_parquet(&path, city, &cols)?,
        }
        println!("Wrote {} {city} trips to {}", args.rows, path.display());
    }
    Ok(())
}

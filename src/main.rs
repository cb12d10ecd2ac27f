// Entry point and interactive CLI flow.
//
// - Option [1] reads every CSV below the data directory and prints what was
//   loaded.
// - Option [2] generates the phase, choropleth, ranking and health reports,
//   a JSON summary and the plain-text market context.
// - After generating reports, the user can go back to the selection menu or
//   exit.
use clap::Parser;
use housing_cycle::choropleth::{percentage_change, symmetric_range, variation_rows, Metric};
use housing_cycle::config::{DataPaths, DATA_DIR_ENV, DEFAULT_DATA_DIR};
use housing_cycle::cycle::current_phase;
use housing_cycle::health::{latest_period, rank_by_health, snapshot_at};
use housing_cycle::output;
use housing_cycle::reports::{self, ContextInputs, RankingMetric, DEFAULT_RANKING_LIMIT};
use housing_cycle::source::{load_housing_data, load_macro_data, load_omi_data, FileSource};
use housing_cycle::types::{HousingData, MacroData, OmiData};
use housing_cycle::util::{self, normalize_region_name, NATIONAL_KEY};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Parser, Debug)]
#[command(name = "housing-cycle", about = "Housing-market cycle reports for the Italian regions")]
struct Cli {
    /// Directory holding the CSV files
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Where report files are written
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Region shown in the phase history and market context
    #[arg(long, default_value = NATIONAL_KEY)]
    region: String,
    /// Choropleth metric: transactions, originalTransactions, averagePrice or priceVar
    #[arg(long, default_value = "averagePrice")]
    metric: Metric,
    /// Choropleth year (defaults to the latest national year)
    #[arg(long)]
    year: Option<String>,
}

// Loaded once with option [1], reused by every report run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<LoadedData>,
}

#[derive(Clone)]
struct LoadedData {
    housing: HousingData,
    macro_data: MacroData,
    omi: OmiData,
}

/// One trimmed line from `input`, or `None` once the input is closed.
fn next_line(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice(input: &mut impl BufRead) -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    next_line(input)
}

/// `true` for `Y`, `false` for `N` or closed input.
fn prompt_back_to_menu(input: &mut impl BufRead) -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let Some(answer) = next_line(input) else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn report_write(result: housing_cycle::Result<()>) {
    if let Err(e) = result {
        eprintln!("Write error: {}", e);
    }
}

/// Handle option [1]: read every dataset below the data directory.
fn handle_load(cli: &Cli) {
    let source = FileSource::new(&cli.data_dir);
    let paths = DataPaths::default();
    log::info!("loading datasets from {}", source.root().display());

    let housing = load_housing_data(&source, &paths);
    let macro_data = load_macro_data(&source, &paths);
    let omi = load_omi_data(&source, &paths);

    if housing.is_empty() {
        println!(
            "Warning: housing datasets unavailable in {} (see log for details).",
            cli.data_dir.display()
        );
    }
    println!(
        "Processing datasets... ({} regions, {} lagging-model years, {} affordability years, {} health regions)",
        util::format_int(housing.regional_data.len()),
        util::format_int(housing.lagging_model_data.len()),
        util::format_int(housing.affordability_mutuo_90mq.len()),
        util::format_int(housing.health_index_data.len())
    );
    println!(
        "Macro series loaded: {} of {}. OMI regions: {}.\n",
        macro_data.len(),
        paths.macro_series.len(),
        util::format_int(omi.len())
    );

    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data = Some(LoadedData {
        housing,
        macro_data,
        omi,
    });
}

/// Handle option [2]: print the report previews and write the report files.
fn handle_generate_reports(cli: &Cli) {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };
    if let Err(e) = std::fs::create_dir_all(&cli.out_dir) {
        eprintln!("Write error: {}", e);
        return;
    }
    let out = |name: &str| -> PathBuf { cli.out_dir.join(name) };
    let housing = &data.housing;
    let region = normalize_region_name(&cli.region);
    let records = housing
        .regional_data
        .get(&region)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let year = cli
        .year
        .clone()
        .or_else(|| reports::latest_year(&housing.regional_data))
        .unwrap_or_default();
    let display_name = reports::display_region_name(&region);

    println!("Generating reports...");
    println!("Outputs saved to {}\n", cli.out_dir.display());

    let phase = current_phase(records);
    let r1 = reports::phase_block_rows(records);
    let file1 = out("report1_phase_history.csv");
    report_write(output::write_csv(&file1, &r1));
    output::preview_table(
        &format!("Report 1: Market Cycle Phases ({})", display_name),
        Some(format!("Current phase: {} - {}", phase.name, phase.description).as_str()),
        &r1,
        5,
    );
    println!("(Full table exported to {})\n", file1.display());

    let variations = percentage_change(&housing.regional_data, cli.metric, &year);
    let scale = symmetric_range(&variations);
    let r2 = variation_rows(&variations, scale);
    let file2 = out("report2_regional_variation.csv");
    report_write(output::write_csv(&file2, &r2));
    output::preview_table(
        &format!("Report 2: {} variation {} vs {}", cli.metric.label(), year, previous_year(&year)),
        Some(format!("Color scale {} .. {}", scale.min, scale.max).as_str()),
        &r2,
        5,
    );
    println!("(Full table exported to {})\n", file2.display());

    let r3 = reports::regional_ranking(&housing.regional_data, RankingMetric::AveragePrice, DEFAULT_RANKING_LIMIT);
    let file3 = out("report3_regional_ranking.csv");
    report_write(output::write_csv(&file3, &r3));
    output::preview_table(
        "Report 3: Regional Ranking",
        Some(format!("Top {} by latest {}", DEFAULT_RANKING_LIMIT, RankingMetric::AveragePrice.label()).as_str()),
        &r3,
        3,
    );
    println!("(Full table exported to {})\n", file3.display());

    let r4 = match latest_period(&housing.health_index_data) {
        Some(period) => rank_by_health(&snapshot_at(&housing.health_index_data, period)),
        None => Vec::new(),
    };
    let file4 = out("report4_health_ranking.csv");
    report_write(output::write_csv(&file4, &r4));
    output::preview_table("Report 4: Market Health Index", Some("Latest semester, 0-100 relative score"), &r4, 3);
    println!("(Full table exported to {})\n", file4.display());

    let r5 = reports::yoy_rows(&reports::yoy_transaction_series(records));
    let file5 = out("report5_transactions_yoy.csv");
    report_write(output::write_csv(&file5, &r5));
    output::preview_table(&format!("Report 5: Transactions YoY ({})", display_name), None, &r5, 3);
    if let Some((size_year, shares)) = reports::size_bucket_shares(records) {
        output::preview_table(&format!("Market split by size ({})", size_year), None, &shares, 5);
        report_write(output::write_csv(&out("report5_size_shares.csv"), &shares));
    }

    if let Some(prices) = data.omi.get(&region) {
        report_write(output::write_json(&out("omi_prices.json"), prices));
    }

    let context = reports::market_context(&ContextInputs {
        display_name: &display_name,
        records,
        lagging: &housing.lagging_model_data,
        affordability: &housing.affordability_mutuo_90mq,
        macro_data: &data.macro_data,
    });
    report_write(output::write_text(&out("market_context.txt"), &context));

    let summary = reports::generate_summary(housing, cli.metric, &year);
    report_write(output::write_json(&out("summary.json"), &summary));
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"national_phase\": \"{}\", \"regions\": {}, \"scale\": [{}, {}]}}\n",
        summary.national_phase,
        summary.total_regions,
        util::format_number(summary.scale_min, 0),
        util::format_number(summary.scale_max, 0)
    );
}

fn previous_year(year: &str) -> String {
    util::parse_year(year).map_or_else(|| "N/D".to_string(), |y| (y - 1).to_string())
}

fn main() {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut input = io::stdin().lock();

    loop {
        println!("Housing Cycle Reports:");
        println!("[1] Load the data files");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice(&mut input) else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&cli),
            "2" => {
                println!();
                handle_generate_reports(&cli);
                if !prompt_back_to_menu(&mut input) {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

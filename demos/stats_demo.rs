use clap::Parser;
use clap::ValueEnum;
use skmap::CuckooConfig;
use skmap::CuckooTable;
use skmap::DefaultHashBuilder;
use skmap::HashFamily;
use skmap::RobinConfig;
use skmap::RobinTable;
use skmap::TableError;
use skmap::stats::DebugStats;
use skmap::stats::print_histogram;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Engine {
    Cuckoo,
    Robin,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short, long, value_enum, default_value_t = Engine::Cuckoo)]
    engine: Engine,

    /// Number of cuckoo hash functions
    #[arg(short = 'k', long, default_value_t = 2)]
    ways: usize,

    /// Maximum load factor, defaults to the engine's
    #[arg(short, long)]
    load_factor: Option<f64>,
}

fn fill<T>(
    table: &mut T,
    stats: impl Fn(&T) -> DebugStats,
    mut insert: impl FnMut(&mut T, u64) -> Result<Option<u64>, TableError>,
) -> Result<(), TableError> {
    let limit = stats(&*table).max_populated;
    println!("Filling table with {limit} u64 values...");
    for value in 0..limit as u64 {
        insert(&mut *table, value)?;
    }
    Ok(())
}

fn report(stats: DebugStats, hist: &[usize], title: &str) {
    println!(
        "Final load factor: {:.2}% of {} slots",
        stats.load_factor * 100.0,
        stats.capacity
    );
    print_histogram(title, hist);
    stats.print();
}

fn main() -> Result<(), TableError> {
    let args = Args::parse();

    println!(
        "Creating {:?} table with target capacity: {}",
        args.engine, args.target_capacity
    );

    match args.engine {
        Engine::Cuckoo => {
            let mut config = CuckooConfig::default();
            if let Some(load_factor) = args.load_factor {
                config = config.max_load_factor(load_factor);
            }
            let hashers = HashFamily::<DefaultHashBuilder>::with_count(args.ways);
            let mut table: CuckooTable<u64, u64, _> =
                CuckooTable::try_with_config(args.target_capacity, config, hashers)?;
            println!("Actual capacity: {}", table.capacity());

            fill(&mut table, |t| t.debug_stats(), |t, v| t.insert(v, v))?;
            report(
                table.debug_stats(),
                &table.probe_histogram(),
                "entries by hash function",
            );
        }
        Engine::Robin => {
            let mut config = RobinConfig::default();
            if let Some(load_factor) = args.load_factor {
                config = config.max_load_factor(load_factor);
            }
            let hashers = HashFamily::<DefaultHashBuilder>::with_count(1);
            let mut table: RobinTable<u64, u64, _> =
                RobinTable::try_with_config(args.target_capacity, config, hashers)?;
            println!("Actual capacity: {}", table.capacity());

            fill(&mut table, |t| t.debug_stats(), |t, v| t.insert(v, v))?;
            report(
                table.debug_stats(),
                &table.probe_histogram(),
                "entries by probe distance",
            );
        }
    }

    Ok(())
}

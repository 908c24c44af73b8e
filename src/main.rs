use std::fs;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;

use vanityhunt::cli::Cli;
use vanityhunt::coordinator::Coordinator;
use vanityhunt::engine::{SearchContext, CPU_GRP_SIZE};
use vanityhunt::index::PrefixIndex;
use vanityhunt::math::scalar_to_bytes;
use vanityhunt::output::OutputSink;
use vanityhunt::seed;

fn main() {
    let cli = Cli::parse();

    let mut inputs = cli.prefixes.clone();
    if let Some(path) = &cli.input {
        match fs::read_to_string(path) {
            Ok(contents) => {
                inputs.extend(
                    contents
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from),
                );
            }
            Err(e) => {
                eprintln!("vanityhunt: cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    if inputs.is_empty() {
        eprintln!("vanityhunt: nothing to search !");
        std::process::exit(1);
    }

    let index = match PrefixIndex::build(&inputs) {
        Ok(index) => index,
        Err(_) => {
            eprintln!("vanityhunt: nothing to search !");
            std::process::exit(1);
        }
    };

    let mode = cli.search_mode();
    if index.entry_count() == 1 {
        println!("Difficulty: {:.0}", index.difficulty());
        println!("Search: {} [{}]", index.first_entry().text, mode.label());
    } else if index.only_full() {
        let (_, min, max) = index.second_level();
        println!(
            "Search: {} addresses (Lookup size {},[{},{}]) [{}]",
            index.entry_count(),
            index.used_bucket_count(),
            min,
            max,
            mode.label()
        );
    } else {
        println!(
            "Search: {} prefixes (Lookup size {}) [{}]",
            index.entry_count(),
            index.used_bucket_count(),
            mode.label()
        );
    }

    let seed_string = cli.seed.clone().unwrap_or_else(seed::default_seed);
    let start_key = seed::derive_start_key(&seed_string);

    println!("Start {}", Local::now().format("%a %b %e %H:%M:%S %Y"));
    if cli.rekey > 0 {
        println!("Base Key: Randomly changed every {} Mkeys", cli.rekey);
    } else {
        println!(
            "Base Key:{}",
            hex::encode_upper(scalar_to_bytes(&start_key))
        );
    }

    let ctx = Arc::new(SearchContext::new(
        index,
        mode,
        cli.stop,
        cli.rekey,
        start_key,
        OutputSink::new(cli.output.clone()),
        CPU_GRP_SIZE,
    ));

    {
        let ctx = Arc::clone(&ctx);
        ctrlc::set_handler(move || {
            println!("\n[!] Stopping...");
            ctx.request_stop();
        })
        .ok();
    }

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    let gpu_ids: Vec<usize> = if cli.gpu { cli.gpu_ids.clone() } else { Vec::new() };

    Coordinator::new(ctx).run(threads, &gpu_ids, &cli.grid);
}

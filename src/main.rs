use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;
use tripgrid::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        let shutdown_signal = {
            let token = cancellation_token.clone();
            async move {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                eprintln!("\nReceived CTRL+C, finishing in-flight partitions...");
                token.cancel();
            }
        };
        tokio::spawn(shutdown_signal);

        // The pipeline honors cancellation at partition boundaries and
        // returns a partial summary rather than an error.
        commands::run(args, cancellation_token).await
    });

    match result {
        Ok(summary) => {
            if summary.stats.cancelled {
                process::exit(130);
            }
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information when no subcommand is provided
fn show_help_and_commands() {
    println!("Tripgrid - Trip Record Feature Pipeline");
    println!("=======================================");
    println!();
    println!("Convert partitioned taxi trip record CSV files into spatially and");
    println!("temporally indexed Parquet feature sets with a dataset quality report.");
    println!();
    println!("USAGE:");
    println!("    tripgrid <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    process     Process trip partitions into enriched Parquet files");
    println!("    report      Compute the quality report without writing partitions");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Process all 2015 partitions into ./output:");
    println!("    tripgrid process 'data/yellow_tripdata_2015-*.csv'");
    println!();
    println!("    # Custom resolutions, region and worker count:");
    println!("    tripgrid process 'data/*.csv' --resolutions 7,9 \\");
    println!("                     --region 40.47,40.92,-74.28,-73.65 -j 4");
    println!();
    println!("    # Quality report only, as JSON:");
    println!("    tripgrid report 'data/*.csv' --output-format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    tripgrid <COMMAND> --help");
}

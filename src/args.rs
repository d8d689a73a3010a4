use clap::Parser;

/// This is a proportional quota allocation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the quota description in JSON format: the total
    /// limit and the units, either inline or as references to CSV files. For more information
    /// about the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of an allocation in JSON format. If
    /// provided, fairquota will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the allocation will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A CSV file of name,count rows. Allows running without a --config
    /// file; in that case --limit provides the total limit.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (integer) The total limit to distribute. Only used together with --input; a config file
    /// carries its own limit.
    #[clap(short, long, value_parser)]
    pub limit: Option<i64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

use clap::{Parser, Subcommand};

/// Records activity survey submissions and highlights duplicate activities.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Appends one submission to the dataset.
    Record {
        /// (file path, optional) JSON configuration. See the manual for the available keys.
        #[clap(short, long, value_parser)]
        config: Option<String>,

        /// (file path, optional) The dataset to append to. Overrides `dataPath` from the configuration.
        #[clap(short, long, value_parser)]
        data: Option<String>,

        /// (file path, optional) A flat JSON object with the fields sent by the form.
        #[clap(short, long, value_parser)]
        form: Option<String>,

        /// (name=value, repeatable) A field of the form. Takes precedence over the --form file.
        #[clap(long = "field", value_parser)]
        fields: Vec<String>,
    },
    /// Highlights the duplicate rows of a dataset, in place.
    Audit {
        /// (file path, optional) JSON configuration. See the manual for the available keys.
        #[clap(short, long, value_parser)]
        config: Option<String>,

        /// (file path) The Excel file to check.
        #[clap(value_parser)]
        path: Option<String>,
    },
}

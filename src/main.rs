mod args;
mod survey;

use std::collections::HashMap;
use std::process::exit;

use chrono::Local;
use clap::Parser;
use log::{debug, LevelFilter};

use crate::args::{Args, Command};
use crate::survey::auditor::run_audit;
use crate::survey::config_reader::{parse_field_pairs, read_config, read_form_fields};
use crate::survey::recorder::{record_submission, SubmissionStatus};
use crate::survey::SurveyResult;

fn init_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }
}

fn collect_fields(form: Option<String>, pairs: &[String]) -> SurveyResult<HashMap<String, String>> {
    let mut fields = match form {
        Some(p) => read_form_fields(p)?,
        None => HashMap::new(),
    };
    fields.extend(parse_field_pairs(pairs)?);
    Ok(fields)
}

fn record_command(
    config_path: Option<String>,
    data: Option<String>,
    form: Option<String>,
    pairs: &[String],
) -> i32 {
    let inputs = read_config(config_path).and_then(|config| {
        let fields = collect_fields(form, pairs)?;
        Ok((config, fields))
    });
    let (mut config, fields) = match inputs {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(d) = data {
        config.data_path = d;
    }
    debug!("record_command: config: {:?} fields: {:?}", config, fields);

    let report = record_submission(&config, &fields, Local::now().naive_local());
    debug!("record_command: status {}", report.status.http_code());
    match report.status {
        SubmissionStatus::Success => {
            println!("{}", report.message);
            0
        }
        SubmissionStatus::Failure => {
            eprintln!("{}", report.message);
            1
        }
    }
}

fn audit_command(config_path: Option<String>, path: Option<String>) -> i32 {
    let path = match path {
        Some(p) => p,
        None => {
            eprintln!("Error: Excel file path not provided.");
            return 1;
        }
    };
    let res = read_config(config_path).and_then(|config| run_audit(&path, &config));
    match res {
        Ok(report) => {
            debug!("audit_command: {:?}", report);
            0
        }
        Err(e @ survey::SurveyError::DatasetNotFound { .. }) => {
            eprintln!("{}", e);
            1
        }
        Err(e) => {
            eprintln!("Error during Excel processing: {}", e);
            1
        }
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // Help and version requests go to stdout and succeed.
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            exit(1);
        }
    };
    init_logging(args.verbose);

    let code = match args.command {
        Command::Record {
            config,
            data,
            form,
            fields,
        } => record_command(config, data, form, &fields),
        Command::Audit { config, path } => audit_command(config, path),
    };
    exit(code);
}

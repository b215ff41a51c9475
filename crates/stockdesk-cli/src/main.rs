// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use stockdesk_api::Client;
use stockdesk_app::{Department, Organization, Position, ResourceApi};
use stockdesk_compat::{CorrectionSet, Detector, HostProfile};
use stockdesk_tui::Console;

/// Touch points reported for `--touch`.
const TOUCH_POINTS: u32 = 5;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `stockdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    if let Some(user_agent) = &options.detect_host {
        let mut profile = HostProfile::new(user_agent);
        if let Some(width) = options.viewport {
            profile = profile.with_viewport(width);
        }
        if options.touch {
            profile = profile.with_touch_points(TOUCH_POINTS);
        }
        print!("{}", host_report(&Detector::new(config.host_markers()), &profile));
        return Ok(());
    }

    let log_path = config.log_path()?;
    logging::init(config.log_level(), &log_path)?;
    tracing::info!(
        config = %options.config_path.display(),
        base_url = config.base_url(),
        "starting"
    );

    let mut client = Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    match config.session_cookie() {
        Some(cookie) => client = client.with_session_cookie(&cookie),
        None => tracing::warn!(
            "no session cookie configured; set [server].session_cookie or {}",
            config::SESSION_ENV
        ),
    }

    let mut runtime = HttpRuntime::new(client);
    if options.check_only {
        let summary = check_backend(&mut runtime).with_context(|| {
            format!(
                "reach {}; check [server].base_url and the session cookie",
                runtime.client().base_url()
            )
        })?;
        println!("{summary}");
        return Ok(());
    }

    let mut console = Console::bootstrap(&mut runtime, config.page_size());
    stockdesk_tui::run_console(&mut console, &mut runtime)
}

/// Fetches every reference list, failing on the first error.
fn check_backend<A: ResourceApi>(api: &mut A) -> Result<String> {
    let departments = api.list::<Department>().context("load departments")?;
    let positions = api.list::<Position>().context("load positions")?;
    let organizations = api.list::<Organization>().context("load organizations")?;
    Ok(format!(
        "ok: {} departments, {} positions, {} organizations",
        departments.len(),
        positions.len(),
        organizations.len()
    ))
}

fn host_report(detector: &Detector, profile: &HostProfile) -> String {
    match detector.detect(profile) {
        None => "inert\n".to_owned(),
        Some(kind) => format!(
            "armed ({kind})\ncorrections: {}\n",
            CorrectionSet::for_host(kind).names().join(", ")
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    detect_host: Option<String>,
    viewport: Option<u32>,
    touch: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        detect_host: None,
        viewport: None,
        touch: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--detect-host" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--detect-host requires a user-agent string"))?;
                options.detect_host = Some(value.as_ref().to_owned());
            }
            "--viewport" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--viewport requires a width in pixels"))?;
                let width = value.as_ref().parse::<u32>().with_context(|| {
                    format!("--viewport expects a width in pixels, got {:?}", value.as_ref())
                })?;
                options.viewport = Some(width);
            }
            "--touch" => {
                options.touch = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.detect_host.is_none() && (options.viewport.is_some() || options.touch) {
        return Err(anyhow!("--viewport and --touch only apply to --detect-host"));
    }

    Ok(options)
}

fn print_help() {
    println!("stockdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and reach the server");
    println!("  --detect-host <ua>       Report whether the compat layer would arm");
    println!("    --viewport <px>        Viewport width for --detect-host");
    println!("    --touch                Report touch support for --detect-host");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, check_backend, host_report, parse_cli_args};
    use crate::runtime::HttpRuntime;
    use anyhow::{Result, anyhow};
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;
    use stockdesk_api::Client;
    use stockdesk_compat::{Detector, HostProfile};
    use tiny_http::{Header, Response, Server};

    const WXWORK_PHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 wxwork/4.1.6";

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/stockdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                detect_host: None,
                viewport: None,
                touch: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for flag in ["--config", "--detect-host", "--viewport"] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(error.to_string().contains("requires"), "{flag}: {error}");
        }
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_detect_host_options() -> Result<()> {
        let options = parse_cli_args(
            vec!["--detect-host", "wxwork", "--viewport", "390", "--touch"],
            default_options_path(),
        )?;
        assert_eq!(options.detect_host.as_deref(), Some("wxwork"));
        assert_eq!(options.viewport, Some(390));
        assert!(options.touch);
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_viewport_and_orphan_flags() {
        let error = parse_cli_args(
            vec!["--detect-host", "ua", "--viewport", "wide"],
            default_options_path(),
        )
        .expect_err("non-numeric viewport should fail");
        assert!(error.to_string().contains("--viewport expects"));

        let error = parse_cli_args(vec!["--touch"], default_options_path())
            .expect_err("--touch without --detect-host should fail");
        assert!(error.to_string().contains("--detect-host"));
    }

    #[test]
    fn parse_cli_args_sets_print_check_and_help_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "-h"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.show_help);
        Ok(())
    }

    #[test]
    fn host_report_names_mode_and_corrections() {
        let detector = Detector::default();
        let phone = HostProfile::new(WXWORK_PHONE).with_viewport(390);
        assert_eq!(
            host_report(&detector, &phone),
            "armed (mobile)\ncorrections: icon-font, icon-glyph-dedup, mobile-menu\n"
        );

        let desktop = HostProfile::new(WXWORK_PHONE).with_viewport(1440);
        assert!(host_report(&detector, &desktop).starts_with("armed (desktop)\n"));

        let plain = HostProfile::new("Mozilla/5.0 (Macintosh) Safari/605.1.15");
        assert_eq!(host_report(&detector, &plain), "inert\n");
    }

    #[test]
    fn check_backend_fetches_every_reference_list() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut paths = Vec::new();
            for _ in 0..3 {
                let request = server.recv().expect("request expected");
                paths.push(request.url().to_owned());
                let body = r#"{"status":"success","data":[{"id":1,"name":"Production"}]}"#;
                let response = Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
                request.respond(response).expect("response should succeed");
            }
            paths
        });

        let client = Client::new(&addr, Duration::from_secs(1))?;
        let mut runtime = HttpRuntime::new(client);
        let summary = check_backend(&mut runtime)?;
        assert_eq!(summary, "ok: 1 departments, 1 positions, 1 organizations");

        let paths = handle.join().expect("server thread should join");
        assert_eq!(
            paths,
            vec!["/api/departments/", "/api/positions/", "/api/organizations/"]
        );
        Ok(())
    }

    #[test]
    fn check_backend_fails_when_server_is_unreachable() -> Result<()> {
        let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))?;
        let mut runtime = HttpRuntime::new(client);
        let error = check_backend(&mut runtime).expect_err("unreachable server should fail");
        assert!(format!("{error:#}").contains("load departments"));
        Ok(())
    }
}

use crate::commands::{Cli, Commands, PlotArgs};
use crate::output::*;
use nicer_cli::{ClientError, PlotClient};
use nicer_core::{
    derive_slot_id, load_settings_file, normalize_settings, parse_gti_spec, ClientSettings,
};
use std::path::Path;
use transport::HttpTransport;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn load_settings(cli: &Cli) -> Result<ClientSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_file(path)?,
        None => ClientSettings::default(),
    };
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    Ok(normalize_settings(settings)?)
}

fn connect(settings: &ClientSettings) -> PlotClient<HttpTransport> {
    let transport = HttpTransport::new(&settings.base_url, settings.request_timeout());
    PlotClient::new(transport, settings.clone())
}

fn finish(client: &PlotClient<HttpTransport>, out: Option<&Path>) -> Result<(), ClientError> {
    let notices = client.session().notices().recent();
    if !notices.is_empty() {
        print_info("Notices:");
        print_notices(&notices);
    }
    if let Some(path) = out {
        client.save_page(path)?;
        print_info(&format!("Page written to {}", path.display()));
    }
    Ok(())
}

fn plot(client: &mut PlotClient<HttpTransport>, args: &PlotArgs) -> Result<(), ClientError> {
    client.bootstrap_csrf()?;
    client.plot(&args.obs_id, args.quality.as_deref(), &args.plot_types)?;
    print_slots(client.session());
    Ok(())
}

pub fn handle_command(cli: Cli) -> CliResult {
    let settings = load_settings(&cli)?;
    let out = cli.out.as_deref();
    match &cli.command {
        Commands::Search { partial } => {
            let mut client = connect(&settings);
            let names = client.search(partial)?;
            print_suggestions(&names);
            finish(&client, out)?;
        }
        Commands::Plot { plot: args } => {
            let mut client = connect(&settings);
            let result = plot(&mut client, args);
            finish(&client, out)?;
            result?;
        }
        Commands::Refine {
            plot: args,
            slot,
            gti,
            min_value,
        } => {
            let mut client = connect(&settings);
            let result = plot(&mut client, args)
                .and_then(|_| client.refine(slot, gti, *min_value));
            finish(&client, out)?;
            result?;
            print_info(&format!("Refined {slot} with GTIs {gti}"));
        }
        Commands::Slug { file } => {
            let fragment = std::fs::read_to_string(file)?;
            let id = derive_slot_id(&fragment)?;
            print_info(&format!("Slot id: {id}"));
        }
        Commands::GtiCheck { spec, max_gti } => {
            let indices = parse_gti_spec(spec, *max_gti)?;
            print_gti_selection(&indices);
        }
    }
    Ok(())
}

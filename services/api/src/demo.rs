use crate::infra::{in_memory_service, seed_catalog, Service};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use travel_agency::config::AppConfig;
use travel_agency::error::AppError;
use travel_agency::packages::{
    NewActivity, NewDestination, NewPackage, NewPassenger, PackageServiceError, Tier,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print each report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
    /// Skip the cancellation at the end of the walkthrough
    #[arg(long)]
    pub(crate) keep_bookings: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogImportArgs {
    /// Catalog CSV with Destination,Activity,Description,Cost,Capacity columns
    pub(crate) path: PathBuf,
}

/// Walk through a Goa trip: Rahul (standard), Sonia (gold) and Asha (premium).
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = in_memory_service(config.booking);

    println!("Travel agency demo");
    println!(
        "Policies: refund {:?}, package capacity {:?}",
        config.booking.refund, config.booking.package_capacity
    );

    let beach_party = service.create_activity(activity(
        "Beach Party",
        "Sunset music on Baga beach",
        2000,
        10,
    ))?;
    let scuba = service.create_activity(activity(
        "Scuba Diving",
        "Reef dive off Grande Island",
        4500,
        2,
    ))?;
    let spice_tour = service.create_activity(activity(
        "Spice Plantation Tour",
        "Guided walk with lunch",
        1000,
        20,
    ))?;
    let goa = service.create_destination(NewDestination {
        name: "Goa".to_string(),
        activity_ids: vec![beach_party.id, scuba.id, spice_tour.id],
    })?;

    let rahul = service.create_passenger(passenger("Rahul", "P-001", Tier::Standard, 50000))?;
    let sonia = service.create_passenger(passenger("Sonia", "P-002", Tier::Gold, 10000))?;
    let asha = service.create_passenger(passenger("Asha", "P-003", Tier::Premium, 0))?;

    let package = service.create_package(NewPackage {
        name: "Goa Getaway".to_string(),
        passenger_capacity: 3,
        destination_ids: vec![goa.id],
        passenger_ids: vec![rahul.id, sonia.id, asha.id],
    })?;

    service.add_activity_to_passenger(package.id, rahul.id, beach_party.id)?;
    service.add_activity_to_passenger(package.id, sonia.id, spice_tour.id)?;
    service.add_activity_to_passenger(package.id, asha.id, scuba.id)?;
    service.add_activity_to_passenger(package.id, rahul.id, scuba.id)?;

    println!("\nSonia tries the full scuba dive");
    match service.add_activity_to_passenger(package.id, sonia.id, scuba.id) {
        Ok(_) => println!("- unexpectedly booked"),
        Err(PackageServiceError::Booking(err)) => println!("- rejected: {err}"),
        Err(err) => return Err(err.into()),
    }

    render(&args, &service.itinerary(package.id)?)?;
    render(&args, &service.manifest(package.id)?)?;
    for id in [rahul.id, sonia.id, asha.id] {
        render(&args, &service.statement(id)?)?;
    }
    render(&args, &service.availability(package.id)?)?;

    if !args.keep_bookings {
        println!("\nRahul cancels the beach party");
        service.remove_activity_from_passenger(package.id, rahul.id, beach_party.id)?;
        render(&args, &service.statement(rahul.id)?)?;
    }

    Ok(())
}

pub(crate) fn run_catalog_import(args: CatalogImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = in_memory_service(config.booking);
    let summary = seed_catalog(&args.path, &service)?;

    println!("Catalog {}", args.path.display());
    println!(
        "{} destinations, {} activities",
        summary.destinations.len(),
        summary.activities.len()
    );
    print_catalog(&service)?;
    Ok(())
}

fn print_catalog(service: &Service) -> Result<(), AppError> {
    for destination in service.destinations()? {
        println!("- {}", destination.name);
        for id in &destination.activities {
            let activity = service.activity(*id)?;
            println!(
                "  - {} (cost {}, {} seats)",
                activity.name, activity.cost, activity.capacity
            );
        }
    }
    Ok(())
}

fn render<T>(args: &DemoArgs, view: &T) -> Result<(), AppError>
where
    T: std::fmt::Display + serde::Serialize,
{
    println!();
    if args.json {
        let rendered = serde_json::to_string_pretty(view)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print!("{view}");
    }
    Ok(())
}

fn activity(name: &str, description: &str, cost: i64, capacity: u32) -> NewActivity {
    NewActivity {
        name: name.to_string(),
        description: description.to_string(),
        cost: Decimal::from(cost),
        capacity,
    }
}

fn passenger(name: &str, number: &str, tier: Tier, balance: i64) -> NewPassenger {
    NewPassenger {
        name: name.to_string(),
        number: number.to_string(),
        tier,
        balance: Decimal::from(balance),
    }
}

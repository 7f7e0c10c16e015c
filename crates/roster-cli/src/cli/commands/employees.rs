use roster_core::{Employee, EmployeeResolver, ResolveSource};

use super::super::args::{GetArgs, ListArgs, SearchArgs, UpdatedSinceArgs};
use crate::exit_codes;

pub async fn list(resolver: &EmployeeResolver, args: ListArgs) -> anyhow::Result<i32> {
    let (employees, source) = resolver.resolve_all_with_source().await?;
    report_source(args.show_source, source);
    print_json(&employees)?;
    Ok(exit_codes::SUCCESS)
}

pub async fn get(resolver: &EmployeeResolver, args: GetArgs) -> anyhow::Result<i32> {
    match resolver.resolve_by_id_with_source(&args.id).await? {
        Some((employee, source)) => {
            report_source(args.show_source, source);
            print_json(&employee)?;
            Ok(exit_codes::SUCCESS)
        }
        None => {
            eprintln!("employee {} not found", args.id);
            Ok(exit_codes::NOT_FOUND)
        }
    }
}

pub async fn annual_salary(resolver: &EmployeeResolver, args: GetArgs) -> anyhow::Result<i32> {
    let annual = resolver.calculate_annual_salary(&args.id).await?;
    println!("{annual}");
    Ok(exit_codes::SUCCESS)
}

pub fn search(resolver: &EmployeeResolver, args: SearchArgs) -> anyhow::Result<i32> {
    let found = resolver.search_by_name(&args.needle, !args.case_sensitive)?;
    print_json(&found)?;
    Ok(exit_codes::SUCCESS)
}

pub fn updated_since(resolver: &EmployeeResolver, args: UpdatedSinceArgs) -> anyhow::Result<i32> {
    let found: Vec<Employee> = resolver.updated_since(args.since)?;
    print_json(&found)?;
    Ok(exit_codes::SUCCESS)
}

fn report_source(show: bool, source: ResolveSource) {
    if show {
        eprintln!("source: {source}");
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

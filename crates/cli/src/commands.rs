//! Command-line surface and dispatch.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::Value as JsonValue;

use cargobay_audit::AuditQuery;
use cargobay_core::{ItemId, LocationId, OperatorId, OrderId, Pagination, ShipmentId};
use cargobay_infra::{BackorderTracker, Config, ShipmentMatcher, StockReconciler};
use cargobay_inventory::{PhysicalCounts, StockCounters};

use crate::warehouse::Warehouse;

/// Warehouse stock reconciliation and cross-dock operations.
///
/// Entities live as JSON files under the data directory; every mutation is
/// appended to the JSON-lines audit log.
#[derive(Parser, Debug)]
#[command(name = "cargobay", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Operator performing the command (defaults to CARGOBAY_OPERATOR).
    #[arg(long, global = true)]
    pub operator: Option<OperatorId>,

    /// Data directory (defaults to CARGOBAY_DATA_DIR, then `data`).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct PageArgs {
    #[arg(long)]
    pub page_number: Option<usize>,

    #[arg(long)]
    pub page_size: Option<usize>,
}

impl PageArgs {
    fn pagination(&self) -> anyhow::Result<Option<Pagination>> {
        Ok(Pagination::from_optional(self.page_number, self.page_size)?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile a physical count file: {"<record id>": {"<location id>": count}}.
    Reconcile {
        #[arg(long)]
        counts: PathBuf,
    },

    /// Show the stock record for an item.
    Totals { item: ItemId },

    /// List stock records.
    Records {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Add a signed quantity at one location.
    Adjust {
        item: ItemId,
        location: LocationId,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Overwrite the quantity at one location.
    SetCount {
        item: ItemId,
        location: LocationId,
        count: u64,
    },

    /// Move stock between two locations of one item.
    Transfer {
        item: ItemId,
        #[arg(long)]
        from: LocationId,
        #[arg(long)]
        to: LocationId,
        #[arg(long)]
        amount: u64,
    },

    /// Replace the expected / ordered / allocated / available counters.
    SetCounters {
        item: ItemId,
        #[arg(long, default_value_t = 0)]
        expected: u64,
        #[arg(long, default_value_t = 0)]
        ordered: u64,
        #[arg(long, default_value_t = 0)]
        allocated: u64,
        #[arg(long, default_value_t = 0)]
        available: u64,
    },

    /// Take a shipment onto the dock (Pending → Transit).
    Receive { shipment: ShipmentId },

    /// Pass a received shipment on to its order (Transit → Delivered).
    Ship { shipment: ShipmentId },

    /// Preview matches of undelivered shipments against their orders.
    Match {
        #[arg(long)]
        shipment: Option<ShipmentId>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Flag an order as backordered for whatever its shipments did not cover.
    Backorder { order: OrderId },

    /// Ordered / shipped / outstanding per item of an order.
    Fulfillment { order: OrderId },

    /// Query the audit log.
    AuditLog {
        /// RFC 3339 lower bound.
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// RFC 3339 upper bound.
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        performed_by: Option<OperatorId>,
        /// Operation prefix, e.g. `crossdock.`.
        #[arg(long)]
        operation: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Resolve configuration and operator, open the warehouse and run the
/// command. Returns the pretty-printed JSON result.
pub fn execute(cli: Cli, mut config: Config) -> anyhow::Result<String> {
    if let Some(dir) = cli.data_dir {
        if config.audit_log.starts_with(&config.data_dir) {
            config.audit_log = dir.join("logs").join("audit.jsonl");
        }
        config.data_dir = dir;
    }
    let operator = cli
        .operator
        .or_else(|| config.operator.clone())
        .ok_or_else(|| anyhow!("no operator given: pass --operator or set CARGOBAY_OPERATOR"))?;

    tracing::debug!(data_dir = %config.data_dir.display(), operator = %operator, "opening warehouse");
    let warehouse = Warehouse::open(&config, &operator)?;
    let output = run(cli.command, &warehouse, &operator)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn run(command: Command, wh: &Warehouse, operator: &OperatorId) -> anyhow::Result<JsonValue> {
    let value = match command {
        Command::Reconcile { counts } => {
            let raw = std::fs::read_to_string(&counts)
                .with_context(|| format!("reading {}", counts.display()))?;
            let raw: BTreeMap<String, BTreeMap<String, i64>> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", counts.display()))?;
            let counts = PhysicalCounts::parse(raw)?;
            serde_json::to_value(wh.reconciliation.reconcile(operator, counts)?)?
        }
        Command::Totals { item } => serde_json::to_value(wh.ledger.get_totals(operator, &item)?)?,
        Command::Records { page } => {
            serde_json::to_value(wh.ledger.list_records(operator, page.pagination()?)?)?
        }
        Command::Adjust {
            item,
            location,
            delta,
        } => serde_json::to_value(wh.ledger.apply_location_delta(operator, &item, location, delta)?)?,
        Command::SetCount {
            item,
            location,
            count,
        } => serde_json::to_value(wh.ledger.set_location_count(operator, &item, location, count)?)?,
        Command::Transfer {
            item,
            from,
            to,
            amount,
        } => serde_json::to_value(wh.ledger.transfer_stock(operator, &item, from, to, amount)?)?,
        Command::SetCounters {
            item,
            expected,
            ordered,
            allocated,
            available,
        } => {
            let counters = StockCounters {
                total_expected: expected,
                total_ordered: ordered,
                total_allocated: allocated,
                total_available: available,
            };
            serde_json::to_value(wh.ledger.set_counters(operator, &item, counters)?)?
        }
        Command::Receive { shipment } => {
            serde_json::to_value(wh.crossdock.receive_shipment(operator, shipment)?)?
        }
        Command::Ship { shipment } => serde_json::to_value(wh.crossdock.ship_items(operator, shipment)?)?,
        Command::Match { shipment, page } => {
            serde_json::to_value(wh.crossdock.match_items(operator, shipment, page.pagination()?)?)?
        }
        Command::Backorder { order } => {
            serde_json::to_value(wh.backorders.update_backorder_status(operator, order)?)?
        }
        Command::Fulfillment { order } => {
            serde_json::to_value(wh.backorders.fulfillment_summary(operator, order)?)?
        }
        Command::AuditLog {
            from,
            to,
            performed_by,
            operation,
            page,
        } => {
            let query = AuditQuery {
                from,
                to,
                performed_by,
                operation_prefix: operation,
            };
            serde_json::to_value(wh.audit_trail.query(operator, &query, page.pagination()?)?)?
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cargobay_core::StockRecordId;
    use cargobay_infra::{EntityStore, JsonFileStore};
    use cargobay_inventory::StockRecord;
    use cargobay_shipping::{Order, OrderItemLine, Shipment, ShipmentItemLine};

    fn config(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            audit_log: dir.join("logs").join("audit.jsonl"),
            operator: Some(OperatorId::new("cli-test").unwrap()),
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cargobay").chain(args.iter().copied())).unwrap()
    }

    fn seed(config: &Config) {
        let records = JsonFileStore::<StockRecord>::open(config.stock_records_path()).unwrap();
        records
            .put(
                StockRecord::new(StockRecordId::new(1), ItemId::new("X").unwrap(), "", Utc::now())
                    .with_locations([(LocationId::new(1), 50), (LocationId::new(2), 30)])
                    .unwrap(),
            )
            .unwrap();

        let shipments = JsonFileStore::<Shipment>::open(config.shipments_path()).unwrap();
        shipments
            .put(Shipment::new(
                ShipmentId::new(1),
                [OrderId::new(1)],
                vec![ShipmentItemLine::new(ItemId::new("X").unwrap(), 6)],
                Utc::now(),
            ))
            .unwrap();

        let orders = JsonFileStore::<Order>::open(config.orders_path()).unwrap();
        orders
            .put(
                Order::new(
                    OrderId::new(1),
                    [ShipmentId::new(1)],
                    vec![OrderItemLine::new(ItemId::new("X").unwrap(), 10)],
                    Utc::now(),
                )
                .unwrap(),
            )
            .unwrap();
    }

    #[test]
    fn negative_delta_parses() {
        match cli(&["adjust", "X", "1", "-5"]).command {
            Command::Adjust { delta, .. } => assert_eq!(delta, -5),
            other => panic!("Expected Adjust, got {other:?}"),
        }
    }

    #[test]
    fn bad_identifiers_are_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["cargobay", "receive", "dock-a"]).is_err());
        assert!(Cli::try_parse_from(["cargobay", "records", "--page-size", "x"]).is_err());
    }

    #[test]
    fn zero_page_size_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let err = execute(cli(&["records", "--page-number", "1", "--page-size", "0"]), config)
            .unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn reconcile_and_cross_dock_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        seed(&config);

        let counts = dir.path().join("count.json");
        std::fs::write(&counts, r#"{ "1": { "1": 45, "2": 30 } }"#).unwrap();
        let out = execute(
            cli(&["reconcile", "--counts", counts.to_str().unwrap()]),
            config.clone(),
        )
        .unwrap();
        let report: JsonValue = serde_json::from_str(&out).unwrap();
        assert_eq!(report.as_array().unwrap().len(), 1);
        assert_eq!(report[0]["delta"], -5);

        let totals: JsonValue =
            serde_json::from_str(&execute(cli(&["totals", "X"]), config.clone()).unwrap()).unwrap();
        assert_eq!(totals["total_on_hand"], 75);

        execute(cli(&["receive", "1"]), config.clone()).unwrap();
        let shipped: JsonValue =
            serde_json::from_str(&execute(cli(&["ship", "1"]), config.clone()).unwrap()).unwrap();
        assert_eq!(shipped[0]["matched_amount"], 6);

        let backordered: JsonValue =
            serde_json::from_str(&execute(cli(&["backorder", "1"]), config.clone()).unwrap()).unwrap();
        assert_eq!(backordered["is_backordered"], true);

        let log: JsonValue = serde_json::from_str(
            &execute(cli(&["audit-log", "--operation", "crossdock."]), config).unwrap(),
        )
        .unwrap();
        assert_eq!(log.as_array().unwrap().len(), 2);
    }

    #[test]
    fn missing_operator_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.operator = None;
        let err = execute(cli(&["records"]), config).unwrap_err();
        assert!(err.to_string().contains("no operator"));
    }
}

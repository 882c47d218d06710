use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::loader::{Dataset, LoadError};

/// Monthly copper and tin prices (USD/ton) for the demo year.
const DEMO_COMMODITIES: &[(u32, f64, f64)] = &[
    (1, 8_350.0, 25_100.0),
    (2, 8_420.0, 25_600.0),
    (3, 8_610.0, 26_900.0),
    (4, 9_050.0, 28_400.0),
    (5, 9_730.0, 32_300.0),
    (6, 9_640.0, 32_800.0),
    (7, 9_410.0, 33_100.0),
    (8, 8_960.0, 31_900.0),
    (9, 9_210.0, 32_500.0),
    (10, 9_540.0, 31_700.0),
    (11, 9_020.0, 29_600.0),
    (12, 8_880.0, 29_200.0),
];

/// Monthly unit prices of the two demo vendors in the tracked family.
const DEMO_VENDOR_PRICES: &[(&str, &[(u32, i64)])] = &[
    (
        "Hanil Valve",
        &[
            (1, 1_000),
            (2, 1_000),
            (3, 1_010),
            (4, 1_020),
            (5, 1_030),
            (6, 1_050),
            (7, 1_080),
            (8, 1_120),
            (9, 1_150),
            (10, 1_150),
            (11, 1_160),
            (12, 1_170),
        ],
    ),
    ("Daeyang Flow", &[(1, 1_040), (4, 1_060), (8, 1_090), (12, 1_100)]),
];

/// The in-memory contents of a demo data directory.
#[derive(Clone, Debug)]
pub struct DemoDataset {
    pub price_table: Vec<Value>,
    pub quotes: Vec<Value>,
    pub orders: Vec<Value>,
    pub commodities: Vec<Value>,
}

impl DemoDataset {
    pub fn standard() -> Self {
        Self {
            price_table: price_table(),
            quotes: quotes(),
            orders: orders(),
            commodities: DEMO_COMMODITIES
                .iter()
                .map(|(month, copper, tin)| {
                    json!({
                        "month": month,
                        "monthLabel": format!("{month}M"),
                        "cuPricePerTon": copper,
                        "snPricePerTon": tin,
                    })
                })
                .collect(),
        }
    }

    pub fn rows(&self, dataset: Dataset) -> &[Value] {
        match dataset {
            Dataset::PriceTable => &self.price_table,
            Dataset::Quotes => &self.quotes,
            Dataset::Orders => &self.orders,
            Dataset::Commodities => &self.commodities,
        }
    }
}

/// Writes the demo dataset as the four JSON tables under `dir`.
pub fn write_demo_dataset(dir: &Path) -> Result<DemoDataset, LoadError> {
    fs::create_dir_all(dir)
        .map_err(|source| LoadError::Write { path: dir.to_path_buf(), source })?;

    let dataset = DemoDataset::standard();
    for table in Dataset::ALL {
        let path = dir.join(table.file_name());
        let body = serde_json::to_string_pretty(dataset.rows(table))
            .map_err(|source| LoadError::Parse { path: path.clone(), source })?;
        fs::write(&path, body).map_err(|source| LoadError::Write { path, source })?;
    }
    Ok(dataset)
}

fn price_table() -> Vec<Value> {
    vec![
        json!({
            "valveType": "VGBARR240AT", "bodyPrice": 1_000, "quantity": 1,
            "optionIP": 45, "optionOP": 30, "optionLock": 25, "optionInd": 18,
            "optionLSW": 120, "optionExt": 60, "optionDiscSCS13": 35, "optionDiscSCS16": 55,
        }),
        json!({
            "valveType": "VGBARR240BT", "bodyPrice": 1_350, "quantity": 1,
            "optionIP": 50, "optionOP": 35, "optionLock": 25, "optionInd": 18,
            "optionLSW": 120, "optionExt": 70, "optionDiscSCS13": 40, "optionDiscSCS16": 65,
        }),
        json!({
            "valveType": "VGGATE150AF", "bodyPrice": 640, "quantity": 1,
            "optionIP": 0, "optionOP": 22, "optionLock": null, "optionInd": 12,
            "optionLSW": 0, "optionExt": 40, "optionDiscSCS13": null, "optionDiscSCS16": null,
        }),
        json!({ "valveType": "VGCHCK080AW", "bodyPrice": null, "quantity": 1 }),
    ]
}

fn orders() -> Vec<Value> {
    let mut rows = Vec::new();
    for (vendor, prices) in DEMO_VENDOR_PRICES {
        for (month, unit_price) in prices.iter() {
            let quantity = 2;
            rows.push(json!({
                "materialNo": "1000BAR240A01",
                "description": "BALL VALVE 240A FULL BORE TR",
                "vendor": vendor,
                "orderDate": format!("2024-{month:02}-15 00:00:00"),
                "orderAmount": unit_price * quantity,
                "quantity": quantity,
                "uom": "EA",
                "valveType": "VGBARR240AT1",
                "valveNo": format!("V-{month:02}"),
                "totalWeight": 0.18,
                "unitWeight": 90,
            }));
        }
    }

    rows.push(json!({
        "materialNo": "1000BAR240A02",
        "description": "BALL VALVE 240A LOCK TR",
        "vendor": "Hanil Valve",
        "orderDate": "2024-06-03",
        "orderAmount": 1_180,
        "quantity": 1,
        "uom": "EA",
        "valveType": "VGBARR240AT2",
    }));
    rows.push(json!({
        "materialNo": "1000BAR240B01",
        "description": "BALL VALVE 240B IP OP",
        "vendor": "Daeyang Flow",
        "orderDate": "2024-09-20",
        "orderAmount": 4_400,
        "quantity": 3,
        "uom": "EA",
        "valveType": "VGBARR240BT1",
        "totalWeight": 0.36,
        "unitWeight": 120,
    }));
    rows.push(json!({
        "materialNo": "1000GAT150A01",
        "description": "GATE VALVE 150A IND",
        "vendor": "Sejin Industrial",
        "orderDate": "2024-11-02",
        "orderAmount": 1_500,
        "quantity": 2,
        "uom": "EA",
        "valveType": "VGGATE150AF1",
    }));
    rows.push(json!({
        "materialNo": "1000CHK080A01",
        "description": "CHECK VALVE 80A",
        "vendor": "Sejin Industrial",
        "orderDate": "2024-05-11",
        "orderAmount": 720,
        "quantity": 1,
        "valveType": "VGCHCK080AW1",
    }));
    rows.push(json!({
        "materialNo": "1000MSC000X01",
        "description": "SPARE GASKET SET",
        "vendor": "Sejin Industrial",
        "orderDate": "2024-02-14",
        "orderAmount": 90,
        "quantity": 10,
        "valveType": "",
    }));
    rows
}

fn quotes() -> Vec<Value> {
    vec![
        json!({
            "no": 1, "materialNo": "2000BAR240A01", "description": "BALL VALVE 240A FULL BORE TR",
            "quantity": 4, "innerPaint": "N0", "outerPaint": "Y", "spec": "SCS13 DISC",
            "quotePrice": 1_050, "reviewComment": "",
        }),
        json!({
            "no": 2, "materialNo": "2000BAR240B01", "description": "BALL VALVE 240B IP OP",
            "quantity": 2, "innerPaint": "Y", "outerPaint": "Y", "spec": "",
            "quotePrice": 1_400,
        }),
        json!({
            "no": 3, "materialNo": "2000GAT150A01", "description": "GATE VALVE 150A IND",
            "quantity": 6, "innerPaint": "N0", "outerPaint": "N0", "spec": "SUS316",
            "quotePrice": 900,
        }),
        json!({
            "no": 4, "materialNo": "2000UNK999Z01", "description": "UNLISTED VALVE",
            "quantity": 1, "quotePrice": 500,
        }),
    ]
}

// Report catalogue - every report the dashboard shows and how its response is shaped
use super::row_set::RowSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    ValvesGeneralInfo,
    ValvesGisInfo,
    ValvesStatus,
    MetersGeneralInfo,
    VirtualMetersGeneralInfo,
    ProgramsGeneralInfo,
    ProgramsDetailedInfo,
    AnalogInputsGeneralInfo,
    AnalogInputsCurrentData,
    AnalogInputsHistoricalData,
    SensorsGeneralInfo,
    SensorsCurrentData,
    SensorsHistoricalData,
    MetersHistoricalAccumulations,
    ValvesHistoricalAccumulations,
}

/// How the upstream body has to be unwrapped before it is a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A bare array of records
    Plain,
    /// `{"status": [...], "LastUpdate": ...}`
    Status,
    /// `{"Data": [...]}`
    CurrentData,
    /// `{"Data": [{"Time": ..., "Data": [...]}, ...]}`
    Historical(Granularity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn caption(self) -> &'static str {
        match self {
            Granularity::Weekly => "Weekly data",
            Granularity::Monthly => "Monthly data",
        }
    }
}

struct ReportSpec {
    kind: ReportKind,
    key: &'static str,
    title: &'static str,
    shape: ResponseShape,
}

static CATALOGUE: [ReportSpec; 15] = [
    ReportSpec {
        kind: ReportKind::ValvesGeneralInfo,
        key: "valves_general_info",
        title: "Valves General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::ValvesGisInfo,
        key: "valves_gis_info",
        title: "Valves GIS Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::ValvesStatus,
        key: "valves_status",
        title: "Valves Status",
        shape: ResponseShape::Status,
    },
    ReportSpec {
        kind: ReportKind::MetersGeneralInfo,
        key: "meters_general_info",
        title: "Meters General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::VirtualMetersGeneralInfo,
        key: "virtual_meters_general_info",
        title: "Virtual Meters General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::ProgramsGeneralInfo,
        key: "programs_general_info",
        title: "Programs General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::ProgramsDetailedInfo,
        key: "programs_detailed_info",
        title: "Programs Detailed Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::AnalogInputsGeneralInfo,
        key: "analog_inputs_general_info",
        title: "Analog Inputs General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::AnalogInputsCurrentData,
        key: "analog_inputs_current_data",
        title: "Analog Inputs Current Data",
        shape: ResponseShape::CurrentData,
    },
    ReportSpec {
        kind: ReportKind::AnalogInputsHistoricalData,
        key: "analog_inputs_historical_data",
        title: "Analog Inputs Historical Data",
        shape: ResponseShape::Historical(Granularity::Weekly),
    },
    ReportSpec {
        kind: ReportKind::SensorsGeneralInfo,
        key: "sensors_general_info",
        title: "Sensors General Info",
        shape: ResponseShape::Plain,
    },
    ReportSpec {
        kind: ReportKind::SensorsCurrentData,
        key: "sensors_current_data",
        title: "Sensors Current Data",
        shape: ResponseShape::CurrentData,
    },
    ReportSpec {
        kind: ReportKind::SensorsHistoricalData,
        key: "sensors_historical_data",
        title: "Sensors Historical Data",
        shape: ResponseShape::Historical(Granularity::Weekly),
    },
    ReportSpec {
        kind: ReportKind::MetersHistoricalAccumulations,
        key: "meters_historical_accumulations",
        title: "Meters Historical Accumulations",
        shape: ResponseShape::Historical(Granularity::Monthly),
    },
    ReportSpec {
        kind: ReportKind::ValvesHistoricalAccumulations,
        key: "valves_historical_accumulations",
        title: "Valves Historical Accumulations",
        shape: ResponseShape::Historical(Granularity::Monthly),
    },
];

impl ReportKind {
    /// Page order
    pub const ALL: [ReportKind; 15] = [
        ReportKind::ValvesGeneralInfo,
        ReportKind::ValvesGisInfo,
        ReportKind::ValvesStatus,
        ReportKind::MetersGeneralInfo,
        ReportKind::VirtualMetersGeneralInfo,
        ReportKind::ProgramsGeneralInfo,
        ReportKind::ProgramsDetailedInfo,
        ReportKind::AnalogInputsGeneralInfo,
        ReportKind::AnalogInputsCurrentData,
        ReportKind::AnalogInputsHistoricalData,
        ReportKind::SensorsGeneralInfo,
        ReportKind::SensorsCurrentData,
        ReportKind::SensorsHistoricalData,
        ReportKind::MetersHistoricalAccumulations,
        ReportKind::ValvesHistoricalAccumulations,
    ];

    fn spec(self) -> &'static ReportSpec {
        // CATALOGUE is laid out in ALL order
        &CATALOGUE[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn title(self) -> &'static str {
        self.spec().title
    }

    pub fn shape(self) -> ResponseShape {
        self.spec().shape
    }

    pub fn from_key(key: &str) -> Option<Self> {
        CATALOGUE.iter().find(|spec| spec.key == key).map(|spec| spec.kind)
    }

    pub fn export_file_name(self, format: ExportFormat) -> String {
        format!("{}.{}", self.key(), format.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn from_param(param: &str) -> Option<Self> {
        match param.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// A rendered report: the table plus what is shown above it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub key: &'static str,
    pub title: &'static str,
    pub caption: Option<String>,
    #[serde(flatten)]
    pub table: RowSet,
}

impl Report {
    pub fn new(kind: ReportKind, caption: Option<String>, table: RowSet) -> Self {
        Self {
            key: kind.key(),
            title: kind.title(),
            caption,
            table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_matches_kind_order() {
        for (index, kind) in ReportKind::ALL.iter().enumerate() {
            assert_eq!(CATALOGUE[index].kind, *kind);
            assert_eq!(*kind as usize, index);
        }
    }

    #[test]
    fn test_keys_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ReportKind::from_key("valves"), None);
    }

    #[test]
    fn test_keys_fit_sheet_names() {
        // Spreadsheet tab names are limited to 31 characters
        assert!(ReportKind::ALL.iter().all(|k| k.key().len() <= 31));
    }

    #[test]
    fn test_export_file_names() {
        assert_eq!(
            ReportKind::ValvesStatus.export_file_name(ExportFormat::Csv),
            "valves_status.csv"
        );
        assert_eq!(
            ReportKind::SensorsHistoricalData.export_file_name(ExportFormat::Xlsx),
            "sensors_historical_data.xlsx"
        );
    }

    #[test]
    fn test_export_format_param() {
        assert_eq!(ExportFormat::from_param("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_param("xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_param("pdf"), None);
    }

    #[test]
    fn test_historical_shapes() {
        assert_eq!(
            ReportKind::AnalogInputsHistoricalData.shape(),
            ResponseShape::Historical(Granularity::Weekly)
        );
        assert_eq!(
            ReportKind::ValvesHistoricalAccumulations.shape(),
            ResponseShape::Historical(Granularity::Monthly)
        );
        assert_eq!(ReportKind::ValvesStatus.shape(), ResponseShape::Status);
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = Report::new(ReportKind::ValvesGisInfo, None, RowSet::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["key"], "valves_gis_info");
        assert!(json["columns"].as_array().unwrap().is_empty());
        assert!(json["rows"].as_array().unwrap().is_empty());
    }
}

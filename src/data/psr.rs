//! Generation source (PSR type) codes.
//!
//! The catalog is closed; codes we do not know pass through unchanged so a new
//! upstream category shows up under its raw code instead of breaking a chart.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PsrType {
    Biomass,
    BrownCoal,
    CoalDerivedGas,
    Gas,
    HardCoal,
    Oil,
    OilShale,
    Peat,
    Geothermal,
    HydroPumpedStorage,
    HydroRunOfRiver,
    HydroReservoir,
    Marine,
    Nuclear,
    OtherRenewable,
    Solar,
    Waste,
    WindOffshore,
    WindOnshore,
    Other,
    EnergyStorage,
}

impl PsrType {
    pub const ALL: [PsrType; 21] = [
        PsrType::Biomass,
        PsrType::BrownCoal,
        PsrType::CoalDerivedGas,
        PsrType::Gas,
        PsrType::HardCoal,
        PsrType::Oil,
        PsrType::OilShale,
        PsrType::Peat,
        PsrType::Geothermal,
        PsrType::HydroPumpedStorage,
        PsrType::HydroRunOfRiver,
        PsrType::HydroReservoir,
        PsrType::Marine,
        PsrType::Nuclear,
        PsrType::OtherRenewable,
        PsrType::Solar,
        PsrType::Waste,
        PsrType::WindOffshore,
        PsrType::WindOnshore,
        PsrType::Other,
        PsrType::EnergyStorage,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PsrType::Biomass => "B01",
            PsrType::BrownCoal => "B02",
            PsrType::CoalDerivedGas => "B03",
            PsrType::Gas => "B04",
            PsrType::HardCoal => "B05",
            PsrType::Oil => "B06",
            PsrType::OilShale => "B07",
            PsrType::Peat => "B08",
            PsrType::Geothermal => "B09",
            PsrType::HydroPumpedStorage => "B10",
            PsrType::HydroRunOfRiver => "B11",
            PsrType::HydroReservoir => "B12",
            PsrType::Marine => "B13",
            PsrType::Nuclear => "B14",
            PsrType::OtherRenewable => "B15",
            PsrType::Solar => "B16",
            PsrType::Waste => "B17",
            PsrType::WindOffshore => "B18",
            PsrType::WindOnshore => "B19",
            PsrType::Other => "B20",
            PsrType::EnergyStorage => "B25",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PsrType::Biomass => "Biomass",
            PsrType::BrownCoal => "Fossil Brown coal/Lignite",
            PsrType::CoalDerivedGas => "Fossil Coal-derived gas",
            PsrType::Gas => "Fossil Gas",
            PsrType::HardCoal => "Fossil Hard coal",
            PsrType::Oil => "Fossil Oil",
            PsrType::OilShale => "Fossil Oil shale",
            PsrType::Peat => "Fossil Peat",
            PsrType::Geothermal => "Geothermal",
            PsrType::HydroPumpedStorage => "Hydro Pumped Storage",
            PsrType::HydroRunOfRiver => "Hydro Run-of-river and poundage",
            PsrType::HydroReservoir => "Hydro Water Reservoir",
            PsrType::Marine => "Marine",
            PsrType::Nuclear => "Nuclear",
            PsrType::OtherRenewable => "Other renewable",
            PsrType::Solar => "Solar",
            PsrType::Waste => "Waste",
            PsrType::WindOffshore => "Wind Offshore",
            PsrType::WindOnshore => "Wind Onshore",
            PsrType::Other => "Other",
            PsrType::EnergyStorage => "Energy storage",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

/// Display label for a PSR code; unknown codes are returned as given.
pub fn translate(code: &str) -> String {
    match PsrType::from_code(code) {
        Some(t) => t.label().to_string(),
        None => code.trim().to_string(),
    }
}

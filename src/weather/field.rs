/// Column of an EPW data row, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeatherField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    DataSource,
    DryBulbTemperature,
    DewPointTemperature,
    RelativeHumidity,
    AtmosphericStationPressure,
    ExtraterrestrialHorizontalRadiation,
    ExtraterrestrialDirectNormalRadiation,
    HorizontalInfraredRadiationIntensity,
    GlobalHorizontalRadiation,
    DirectNormalRadiation,
    DiffuseHorizontalRadiation,
    GlobalHorizontalIlluminance,
    DirectNormalIlluminance,
    DiffuseHorizontalIlluminance,
    ZenithLuminance,
    WindDirection,
    WindSpeed,
    TotalSkyCover,
    OpaqueSkyCover,
    Visibility,
    CeilingHeight,
    PresentWeatherObservation,
    PresentWeatherCodes,
    PrecipitableWater,
    AerosolOpticalDepth,
    SnowDepth,
    DaysSinceLastSnowfall,
    Albedo,
    LiquidPrecipitationDepth,
    LiquidPrecipitationQuantity,
}

/// Number of columns in an EPW data row.
pub const NUM_FIELDS: usize = 35;

/// Columns before the first numeric weather value (date/time and data source flags).
pub const FIRST_VALUE_COLUMN: usize = 6;

/// Number of numeric weather value columns.
pub const NUM_VALUE_FIELDS: usize = NUM_FIELDS - FIRST_VALUE_COLUMN;

impl WeatherField {
    pub const ALL: [WeatherField; NUM_FIELDS] = [
        WeatherField::Year,
        WeatherField::Month,
        WeatherField::Day,
        WeatherField::Hour,
        WeatherField::Minute,
        WeatherField::DataSource,
        WeatherField::DryBulbTemperature,
        WeatherField::DewPointTemperature,
        WeatherField::RelativeHumidity,
        WeatherField::AtmosphericStationPressure,
        WeatherField::ExtraterrestrialHorizontalRadiation,
        WeatherField::ExtraterrestrialDirectNormalRadiation,
        WeatherField::HorizontalInfraredRadiationIntensity,
        WeatherField::GlobalHorizontalRadiation,
        WeatherField::DirectNormalRadiation,
        WeatherField::DiffuseHorizontalRadiation,
        WeatherField::GlobalHorizontalIlluminance,
        WeatherField::DirectNormalIlluminance,
        WeatherField::DiffuseHorizontalIlluminance,
        WeatherField::ZenithLuminance,
        WeatherField::WindDirection,
        WeatherField::WindSpeed,
        WeatherField::TotalSkyCover,
        WeatherField::OpaqueSkyCover,
        WeatherField::Visibility,
        WeatherField::CeilingHeight,
        WeatherField::PresentWeatherObservation,
        WeatherField::PresentWeatherCodes,
        WeatherField::PrecipitableWater,
        WeatherField::AerosolOpticalDepth,
        WeatherField::SnowDepth,
        WeatherField::DaysSinceLastSnowfall,
        WeatherField::Albedo,
        WeatherField::LiquidPrecipitationDepth,
        WeatherField::LiquidPrecipitationQuantity,
    ];

    /// Zero-based column index in the EPW data row.
    pub fn column(self) -> usize {
        self as usize
    }

    /// Index into the numeric value block, `None` for date/time and data source columns.
    pub fn value_index(self) -> Option<usize> {
        self.column().checked_sub(FIRST_VALUE_COLUMN)
    }

    /// The numeric weather fields (everything after the data source flags).
    pub fn values() -> impl Iterator<Item = WeatherField> {
        Self::ALL[FIRST_VALUE_COLUMN..].iter().copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            WeatherField::Year => "Year",
            WeatherField::Month => "Month",
            WeatherField::Day => "Day",
            WeatherField::Hour => "Hour",
            WeatherField::Minute => "Minute",
            WeatherField::DataSource => "Data Source and Uncertainty Flags",
            WeatherField::DryBulbTemperature => "Dry Bulb Temperature",
            WeatherField::DewPointTemperature => "Dew Point Temperature",
            WeatherField::RelativeHumidity => "Relative Humidity",
            WeatherField::AtmosphericStationPressure => "Atmospheric Station Pressure",
            WeatherField::ExtraterrestrialHorizontalRadiation => {
                "Extraterrestrial Horizontal Radiation"
            }
            WeatherField::ExtraterrestrialDirectNormalRadiation => {
                "Extraterrestrial Direct Normal Radiation"
            }
            WeatherField::HorizontalInfraredRadiationIntensity => {
                "Horizontal Infrared Radiation Intensity"
            }
            WeatherField::GlobalHorizontalRadiation => "Global Horizontal Radiation",
            WeatherField::DirectNormalRadiation => "Direct Normal Radiation",
            WeatherField::DiffuseHorizontalRadiation => "Diffuse Horizontal Radiation",
            WeatherField::GlobalHorizontalIlluminance => "Global Horizontal Illuminance",
            WeatherField::DirectNormalIlluminance => "Direct Normal Illuminance",
            WeatherField::DiffuseHorizontalIlluminance => "Diffuse Horizontal Illuminance",
            WeatherField::ZenithLuminance => "Zenith Luminance",
            WeatherField::WindDirection => "Wind Direction",
            WeatherField::WindSpeed => "Wind Speed",
            WeatherField::TotalSkyCover => "Total Sky Cover",
            WeatherField::OpaqueSkyCover => "Opaque Sky Cover",
            WeatherField::Visibility => "Visibility",
            WeatherField::CeilingHeight => "Ceiling Height",
            WeatherField::PresentWeatherObservation => "Present Weather Observation",
            WeatherField::PresentWeatherCodes => "Present Weather Codes",
            WeatherField::PrecipitableWater => "Precipitable Water",
            WeatherField::AerosolOpticalDepth => "Aerosol Optical Depth",
            WeatherField::SnowDepth => "Snow Depth",
            WeatherField::DaysSinceLastSnowfall => "Days Since Last Snowfall",
            WeatherField::Albedo => "Albedo",
            WeatherField::LiquidPrecipitationDepth => "Liquid Precipitation Depth",
            WeatherField::LiquidPrecipitationQuantity => "Liquid Precipitation Quantity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_indices_follow_file_order() {
        for (i, f) in WeatherField::ALL.iter().enumerate() {
            assert_eq!(f.column(), i);
        }
        assert_eq!(WeatherField::DryBulbTemperature.column(), 6);
        assert_eq!(WeatherField::RelativeHumidity.column(), 8);
        assert_eq!(WeatherField::WindDirection.column(), 20);
        assert_eq!(WeatherField::WindSpeed.column(), 21);
    }

    #[test]
    fn test_value_index() {
        assert_eq!(WeatherField::Minute.value_index(), None);
        assert_eq!(WeatherField::DataSource.value_index(), None);
        assert_eq!(WeatherField::DryBulbTemperature.value_index(), Some(0));
        assert_eq!(
            WeatherField::LiquidPrecipitationQuantity.value_index(),
            Some(NUM_VALUE_FIELDS - 1)
        );
        assert_eq!(WeatherField::values().count(), NUM_VALUE_FIELDS);
    }
}

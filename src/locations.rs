//! Reference points that customers and sites are drawn from.
//!
//! The generator only needs a [`LocationSource`] that can hand out `n`
//! distinct points. [`ReferenceTable::us_cities`] is the built-in source: a
//! compiled-in table of US cities keyed by a central zip code.

use rand::seq::index;
use rand::RngCore;
use std::collections::HashSet;

use crate::domain::GeoPoint;
use crate::error::{Error, Result};

/// A labeled point handed out by a [`LocationSource`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReferencePoint {
    /// Source identifier (a zip code for the built-in table).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Coordinates.
    pub location: GeoPoint,
}

/// Supplies distinct geographic points on request.
pub trait LocationSource: Send + Sync {
    /// Number of distinct points available.
    fn len(&self) -> usize;

    /// Returns true if the source holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draws `n` distinct points without replacement, in draw order.
    ///
    /// Fails with [`Error::InsufficientLocations`] if `n > self.len()`.
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<ReferencePoint>>;
}

/// An in-memory, deduplicated list of reference points.
///
/// # Examples
///
/// ```
/// use facility_location::locations::{LocationSource, ReferenceTable};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let table = ReferenceTable::us_cities();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let points = table.sample(10, &mut rng).unwrap();
/// assert_eq!(points.len(), 10);
///
/// // Asking for more than the table holds is an error
/// assert!(table.sample(table.len() + 1, &mut rng).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ReferenceTable {
    points: Vec<ReferencePoint>,
}

impl ReferenceTable {
    /// Builds a table, keeping the first occurrence of each coordinate pair.
    pub fn new(points: impl IntoIterator<Item = ReferencePoint>) -> Self {
        let mut seen = HashSet::new();
        let points = points
            .into_iter()
            .filter(|p| seen.insert((p.location.lat.to_bits(), p.location.lon.to_bits())))
            .collect();
        Self { points }
    }

    /// The built-in table of US cities.
    pub fn us_cities() -> Self {
        Self::new(US_CITIES.iter().map(|city| ReferencePoint {
            id: city.zip.to_string(),
            name: city.name.to_string(),
            location: GeoPoint::new(city.lat, city.lon),
        }))
    }
}

impl LocationSource for ReferenceTable {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<ReferencePoint>> {
        if n > self.points.len() {
            return Err(Error::InsufficientLocations {
                requested: n,
                available: self.points.len(),
            });
        }

        Ok(index::sample(rng, self.points.len(), n)
            .into_iter()
            .map(|i| self.points[i].clone())
            .collect())
    }
}

struct CityData {
    zip: &'static str,
    name: &'static str,
    lat: f64,
    lon: f64,
}

const US_CITIES: &[CityData] = &[
    CityData { zip: "10001", name: "New York, NY", lat: 40.7506, lon: -73.9972 },
    CityData { zip: "90012", name: "Los Angeles, CA", lat: 34.0614, lon: -118.2385 },
    CityData { zip: "60602", name: "Chicago, IL", lat: 41.8830, lon: -87.6292 },
    CityData { zip: "77002", name: "Houston, TX", lat: 29.7566, lon: -95.3650 },
    CityData { zip: "85004", name: "Phoenix, AZ", lat: 33.4515, lon: -112.0685 },
    CityData { zip: "19107", name: "Philadelphia, PA", lat: 39.9522, lon: -75.1593 },
    CityData { zip: "78205", name: "San Antonio, TX", lat: 29.4237, lon: -98.4925 },
    CityData { zip: "92101", name: "San Diego, CA", lat: 32.7190, lon: -117.1628 },
    CityData { zip: "75201", name: "Dallas, TX", lat: 32.7876, lon: -96.7994 },
    CityData { zip: "95113", name: "San Jose, CA", lat: 37.3337, lon: -121.8907 },
    CityData { zip: "78701", name: "Austin, TX", lat: 30.2711, lon: -97.7437 },
    CityData { zip: "32202", name: "Jacksonville, FL", lat: 30.3289, lon: -81.6528 },
    CityData { zip: "76102", name: "Fort Worth, TX", lat: 32.7541, lon: -97.3307 },
    CityData { zip: "43215", name: "Columbus, OH", lat: 39.9650, lon: -83.0037 },
    CityData { zip: "28202", name: "Charlotte, NC", lat: 35.2270, lon: -80.8431 },
    CityData { zip: "94102", name: "San Francisco, CA", lat: 37.7793, lon: -122.4193 },
    CityData { zip: "46204", name: "Indianapolis, IN", lat: 39.7716, lon: -86.1557 },
    CityData { zip: "98101", name: "Seattle, WA", lat: 47.6107, lon: -122.3344 },
    CityData { zip: "80202", name: "Denver, CO", lat: 39.7530, lon: -104.9993 },
    CityData { zip: "20001", name: "Washington, DC", lat: 38.9098, lon: -77.0173 },
    CityData { zip: "02108", name: "Boston, MA", lat: 42.3576, lon: -71.0643 },
    CityData { zip: "79901", name: "El Paso, TX", lat: 31.7587, lon: -106.4869 },
    CityData { zip: "37203", name: "Nashville, TN", lat: 36.1503, lon: -86.7916 },
    CityData { zip: "48226", name: "Detroit, MI", lat: 42.3314, lon: -83.0458 },
    CityData { zip: "73102", name: "Oklahoma City, OK", lat: 35.4707, lon: -97.5193 },
    CityData { zip: "97204", name: "Portland, OR", lat: 45.5184, lon: -122.6745 },
    CityData { zip: "89101", name: "Las Vegas, NV", lat: 36.1727, lon: -115.1413 },
    CityData { zip: "38103", name: "Memphis, TN", lat: 35.1447, lon: -90.0529 },
    CityData { zip: "40202", name: "Louisville, KY", lat: 38.2527, lon: -85.7585 },
    CityData { zip: "21202", name: "Baltimore, MD", lat: 39.2990, lon: -76.6086 },
    CityData { zip: "53202", name: "Milwaukee, WI", lat: 43.0439, lon: -87.8997 },
    CityData { zip: "87102", name: "Albuquerque, NM", lat: 35.0844, lon: -106.6504 },
    CityData { zip: "85701", name: "Tucson, AZ", lat: 32.2217, lon: -110.9697 },
    CityData { zip: "93721", name: "Fresno, CA", lat: 36.7330, lon: -119.7845 },
    CityData { zip: "95814", name: "Sacramento, CA", lat: 38.5804, lon: -121.4945 },
    CityData { zip: "64106", name: "Kansas City, MO", lat: 39.1052, lon: -94.5724 },
    CityData { zip: "30303", name: "Atlanta, GA", lat: 33.7525, lon: -84.3888 },
    CityData { zip: "68102", name: "Omaha, NE", lat: 41.2626, lon: -95.9350 },
    CityData { zip: "80903", name: "Colorado Springs, CO", lat: 38.8385, lon: -104.8194 },
    CityData { zip: "27601", name: "Raleigh, NC", lat: 35.7733, lon: -78.6346 },
    CityData { zip: "23510", name: "Norfolk, VA", lat: 36.8508, lon: -76.2859 },
    CityData { zip: "33130", name: "Miami, FL", lat: 25.7663, lon: -80.2005 },
    CityData { zip: "55401", name: "Minneapolis, MN", lat: 44.9849, lon: -93.2702 },
    CityData { zip: "74103", name: "Tulsa, OK", lat: 36.1540, lon: -95.9928 },
    CityData { zip: "44113", name: "Cleveland, OH", lat: 41.4870, lon: -81.6962 },
    CityData { zip: "67202", name: "Wichita, KS", lat: 37.6872, lon: -97.3356 },
    CityData { zip: "70112", name: "New Orleans, LA", lat: 29.9566, lon: -90.0763 },
    CityData { zip: "76010", name: "Arlington, TX", lat: 32.7258, lon: -97.0812 },
    CityData { zip: "33602", name: "Tampa, FL", lat: 27.9515, lon: -82.4574 },
    CityData { zip: "96813", name: "Honolulu, HI", lat: 21.3094, lon: -157.8585 },
    CityData { zip: "92701", name: "Santa Ana, CA", lat: 33.7476, lon: -117.8670 },
    CityData { zip: "63101", name: "St. Louis, MO", lat: 38.6318, lon: -90.1921 },
    CityData { zip: "15222", name: "Pittsburgh, PA", lat: 40.4473, lon: -79.9930 },
    CityData { zip: "45202", name: "Cincinnati, OH", lat: 39.1072, lon: -84.5031 },
    CityData { zip: "99501", name: "Anchorage, AK", lat: 61.2167, lon: -149.8770 },
    CityData { zip: "27401", name: "Greensboro, NC", lat: 36.0692, lon: -79.7917 },
    CityData { zip: "07102", name: "Newark, NJ", lat: 40.7357, lon: -74.1724 },
    CityData { zip: "43604", name: "Toledo, OH", lat: 41.6528, lon: -83.5379 },
    CityData { zip: "14202", name: "Buffalo, NY", lat: 42.8864, lon: -78.8784 },
    CityData { zip: "46802", name: "Fort Wayne, IN", lat: 41.0776, lon: -85.1394 },
    CityData { zip: "68508", name: "Lincoln, NE", lat: 40.8136, lon: -96.7026 },
    CityData { zip: "27701", name: "Durham, NC", lat: 35.9940, lon: -78.8986 },
    CityData { zip: "32801", name: "Orlando, FL", lat: 28.5421, lon: -81.3790 },
    CityData { zip: "23219", name: "Richmond, VA", lat: 37.5407, lon: -77.4360 },
    CityData { zip: "89501", name: "Reno, NV", lat: 39.5262, lon: -119.8127 },
    CityData { zip: "83702", name: "Boise, ID", lat: 43.6150, lon: -116.2023 },
    CityData { zip: "99201", name: "Spokane, WA", lat: 47.6588, lon: -117.4260 },
    CityData { zip: "35203", name: "Birmingham, AL", lat: 33.5186, lon: -86.8104 },
    CityData { zip: "14604", name: "Rochester, NY", lat: 43.1566, lon: -77.6088 },
    CityData { zip: "50309", name: "Des Moines, IA", lat: 41.5868, lon: -93.6250 },
    CityData { zip: "36602", name: "Mobile, AL", lat: 30.6954, lon: -88.0399 },
    CityData { zip: "84101", name: "Salt Lake City, UT", lat: 40.7608, lon: -111.8910 },
    CityData { zip: "72201", name: "Little Rock, AR", lat: 34.7465, lon: -92.2896 },
    CityData { zip: "39201", name: "Jackson, MS", lat: 32.2988, lon: -90.1848 },
    CityData { zip: "37902", name: "Knoxville, TN", lat: 35.9606, lon: -83.9207 },
    CityData { zip: "29401", name: "Charleston, SC", lat: 32.7765, lon: -79.9311 },
    CityData { zip: "29201", name: "Columbia, SC", lat: 34.0007, lon: -81.0348 },
    CityData { zip: "31401", name: "Savannah, GA", lat: 32.0809, lon: -81.0912 },
    CityData { zip: "32301", name: "Tallahassee, FL", lat: 30.4383, lon: -84.2807 },
    CityData { zip: "70801", name: "Baton Rouge, LA", lat: 30.4515, lon: -91.1871 },
    CityData { zip: "71101", name: "Shreveport, LA", lat: 32.5252, lon: -93.7502 },
    CityData { zip: "79401", name: "Lubbock, TX", lat: 33.5779, lon: -101.8552 },
    CityData { zip: "79101", name: "Amarillo, TX", lat: 35.2220, lon: -101.8313 },
    CityData { zip: "78401", name: "Corpus Christi, TX", lat: 27.8006, lon: -97.3964 },
    CityData { zip: "57104", name: "Sioux Falls, SD", lat: 43.5446, lon: -96.7311 },
    CityData { zip: "58102", name: "Fargo, ND", lat: 46.8772, lon: -96.7898 },
    CityData { zip: "58501", name: "Bismarck, ND", lat: 46.8083, lon: -100.7837 },
    CityData { zip: "59101", name: "Billings, MT", lat: 45.7833, lon: -108.5007 },
    CityData { zip: "82001", name: "Cheyenne, WY", lat: 41.1400, lon: -104.8202 },
    CityData { zip: "57701", name: "Rapid City, SD", lat: 44.0805, lon: -103.2310 },
    CityData { zip: "55101", name: "St. Paul, MN", lat: 44.9537, lon: -93.0900 },
    CityData { zip: "55802", name: "Duluth, MN", lat: 46.7867, lon: -92.1005 },
    CityData { zip: "53703", name: "Madison, WI", lat: 43.0731, lon: -89.4012 },
    CityData { zip: "54301", name: "Green Bay, WI", lat: 44.5133, lon: -88.0133 },
    CityData { zip: "49503", name: "Grand Rapids, MI", lat: 42.9634, lon: -85.6681 },
    CityData { zip: "48933", name: "Lansing, MI", lat: 42.7325, lon: -84.5555 },
    CityData { zip: "61602", name: "Peoria, IL", lat: 40.6936, lon: -89.5890 },
    CityData { zip: "62701", name: "Springfield, IL", lat: 39.7817, lon: -89.6501 },
    CityData { zip: "65806", name: "Springfield, MO", lat: 37.2090, lon: -93.2923 },
    CityData { zip: "52401", name: "Cedar Rapids, IA", lat: 41.9779, lon: -91.6656 },
    CityData { zip: "66603", name: "Topeka, KS", lat: 39.0473, lon: -95.6752 },
    CityData { zip: "72701", name: "Fayetteville, AR", lat: 36.0822, lon: -94.1719 },
    CityData { zip: "37402", name: "Chattanooga, TN", lat: 35.0456, lon: -85.3097 },
    CityData { zip: "40507", name: "Lexington, KY", lat: 38.0406, lon: -84.5037 },
    CityData { zip: "25301", name: "Charleston, WV", lat: 38.3498, lon: -81.6326 },
    CityData { zip: "24011", name: "Roanoke, VA", lat: 37.2710, lon: -79.9414 },
    CityData { zip: "17101", name: "Harrisburg, PA", lat: 40.2732, lon: -76.8867 },
    CityData { zip: "12207", name: "Albany, NY", lat: 42.6526, lon: -73.7562 },
    CityData { zip: "13202", name: "Syracuse, NY", lat: 43.0481, lon: -76.1474 },
    CityData { zip: "06103", name: "Hartford, CT", lat: 41.7658, lon: -72.6734 },
    CityData { zip: "02903", name: "Providence, RI", lat: 41.8240, lon: -71.4128 },
    CityData { zip: "04101", name: "Portland, ME", lat: 43.6591, lon: -70.2568 },
    CityData { zip: "03101", name: "Manchester, NH", lat: 42.9956, lon: -71.4548 },
    CityData { zip: "05401", name: "Burlington, VT", lat: 44.4759, lon: -73.2121 },
    CityData { zip: "19801", name: "Wilmington, DE", lat: 39.7391, lon: -75.5398 },
    CityData { zip: "08608", name: "Trenton, NJ", lat: 40.2206, lon: -74.7597 },
    CityData { zip: "97401", name: "Eugene, OR", lat: 44.0521, lon: -123.0868 },
    CityData { zip: "98402", name: "Tacoma, WA", lat: 47.2529, lon: -122.4443 },
    CityData { zip: "93301", name: "Bakersfield, CA", lat: 35.3733, lon: -119.0187 },
    CityData { zip: "92501", name: "Riverside, CA", lat: 33.9806, lon: -117.3755 },
    CityData { zip: "86001", name: "Flagstaff, AZ", lat: 35.1983, lon: -111.6513 },
    CityData { zip: "87501", name: "Santa Fe, NM", lat: 35.6870, lon: -105.9378 },
    CityData { zip: "81501", name: "Grand Junction, CO", lat: 39.0639, lon: -108.5506 },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn point(id: &str, lat: f64, lon: f64) -> ReferencePoint {
        ReferencePoint {
            id: id.to_string(),
            name: id.to_string(),
            location: GeoPoint::new(lat, lon),
        }
    }

    #[test]
    fn test_us_cities_are_distinct_and_valid() {
        let table = ReferenceTable::us_cities();
        assert_eq!(table.len(), US_CITIES.len());
        assert!(table.len() >= 100);
        assert!(table.points.iter().all(|p| p.location.is_valid()));
    }

    #[test]
    fn test_duplicate_coordinates_are_dropped() {
        let table = ReferenceTable::new(vec![
            point("a", 1.0, 1.0),
            point("b", 1.0, 1.0),
            point("c", 2.0, 2.0),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.points[0].id, "a");
        assert_eq!(table.points[1].id, "c");
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let table = ReferenceTable::us_cities();
        let mut rng = StdRng::seed_from_u64(42);
        let points = table.sample(table.len(), &mut rng).unwrap();

        let ids: HashSet<_> = points.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), table.len());
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let table = ReferenceTable::us_cities();
        let a = table.sample(5, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = table.sample(5, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_insufficient_locations() {
        let table = ReferenceTable::new(vec![point("a", 1.0, 1.0)]);
        let err = table.sample(2, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientLocations {
                requested: 2,
                available: 1
            }
        );
        assert!(ReferenceTable::new(Vec::new()).is_empty());
    }
}

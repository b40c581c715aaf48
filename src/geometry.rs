use ndarray::parallel::prelude::*;
use ndarray::prelude::*;


/// Mean earth radius used for all great-circle distances, in km.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> GeoPoint {
        GeoPoint{lat_deg, lon_deg}
    }

    pub fn as_radians(&self) -> [f64; 2] {
        [self.lat_deg.to_radians(), self.lon_deg.to_radians()]
    }

    /// Great-circle distance to `other` by the haversine formula.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let [lat1, lon1] = self.as_radians();
        let [lat2, lon2] = other.as_radians();
        haversine(lat1, lon1, lat2, lon2)
    }
}

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let aa = (dlat / 2.).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.).sin().powi(2);
    2. * EARTH_RADIUS_KM * aa.sqrt().atan2((1. - aa).sqrt())
}


/// Computes the great-circle distance between each pair of points.  The result is symmetric
/// with a zero diagonal, so it can be handed to `TransitNetwork::from_matrix` as is.
pub fn distance_matrix_km(points: &[GeoPoint]) -> Array<f64, Ix2> {
    let num_points = points.len();
    let mut rads = Array::zeros((num_points, 2));
    for (ii, point) in points.iter().enumerate() {
        let [lat, lon] = point.as_radians();
        rads[[ii, 0]] = lat;
        rads[[ii, 1]] = lon;
    }

    let mut dists_mat = Array::zeros((num_points, num_points));
    // only the upper triangle is computed; rows are independent
    dists_mat.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(ii, mut row): (usize, ArrayViewMut1<f64>)| {
            for jj in ii + 1..num_points {
                row[jj] = haversine(rads[[ii, 0]], rads[[ii, 1]], rads[[jj, 0]],
                                    rads[[jj, 1]]);
            }
        });
    for ii in 0..num_points {
        for jj in 0..ii {
            dists_mat[[ii, jj]] = dists_mat[[jj, ii]];
        }
    }

    dists_mat
}


#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_ulps_eq};

    use super::*;

    #[test]
    fn test_haversine() {
        let montreal = GeoPoint::new(45.5017, -73.5673);
        let laval = GeoPoint::new(45.6066, -73.7124);
        let dist = montreal.haversine_km(&laval);
        assert_abs_diff_eq!(dist, 16.25, epsilon = 0.1);
        assert_ulps_eq!(dist, laval.haversine_km(&montreal));
        assert_eq!(montreal.haversine_km(&montreal), 0.);

        // a quarter of the equator
        let quarter = GeoPoint::new(0., 0.).haversine_km(&GeoPoint::new(0., 90.));
        assert_abs_diff_eq!(quarter, std::f64::consts::PI * EARTH_RADIUS_KM / 2.,
                            epsilon = 1e-9);
    }

    #[test]
    fn test_distance_matrix() {
        let points = vec![GeoPoint::new(45.5, -73.6), GeoPoint::new(45.6, -73.7),
                          GeoPoint::new(45.4, -73.5), GeoPoint::new(46.8, -71.2)];
        let dists = distance_matrix_km(&points);
        assert_eq!(dists.shape(), &[4, 4]);
        for ii in 0..4 {
            assert_eq!(dists[[ii, ii]], 0.);
            for jj in 0..4 {
                assert_eq!(dists[[ii, jj]], dists[[jj, ii]]);
                if ii != jj {
                    assert_ulps_eq!(dists[[ii, jj]], points[ii].haversine_km(&points[jj]));
                }
            }
        }
        assert_eq!(distance_matrix_km(&[]).shape(), &[0, 0]);
    }
}

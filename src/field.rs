use crate::error::FieldError;
use crate::geometry::Geometry;
use image::{GrayImage, Rgba, RgbaImage};
use log::{debug, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use spatial_model_common::SpeciesPalette;
use std::fmt;
use std::str::FromStr;

/// Number of extra concentration slots per species appended after the compartment
/// pixels. Slot `pixel_count()` holds the Dirichlet exterior value.
const N_BOUNDARY_SLOTS: usize = 1;
/// Opacity applied to each species' colour when rendering concentrations.
const DISPLAY_OPACITY: f64 = 0.75;
/// Floor on the per-species maximum used to rescale concentrations for display.
const MIN_DISPLAY_MAX: f64 = 1e-5;
/// Neighbour offsets, in neighbour-table order: +x, -x, +y, -y.
const NEIGHBOUR_OFFSETS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// How a pixel's missing neighbour (outside the compartment) is resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// Missing neighbours read the shared exterior slot, which holds a fixed value.
    Dirichlet,
    /// Missing neighbours read the pixel itself, giving zero flux across the boundary.
    Neumann,
}

impl FromStr for BoundaryCondition {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dirichlet" => Ok(BoundaryCondition::Dirichlet),
            "neumann" => Ok(BoundaryCondition::Neumann),
            _ => Err(FieldError::UnsupportedBoundaryCondition(s.to_string())),
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryCondition::Dirichlet => write!(f, "dirichlet"),
            BoundaryCondition::Neumann => write!(f, "neumann"),
        }
    }
}

/// Species concentrations over one compartment, plus the machinery to diffuse them.
///
/// Concentrations are stored pixel-major: the value of species `s` at pixel `i`
/// lives at `species_count() * i + s`. After the compartment pixels comes one
/// exterior slot per species used by Dirichlet boundaries.
#[derive(Debug, Clone)]
pub struct Field<'g> {
    geometry: &'g Geometry,
    n_species: usize,
    n_pixels: usize,
    boundary_condition: BoundaryCondition,
    // Neighbour pixel indices of pixel i:
    // [4*i+0] = +x, [4*i+1] = -x, [4*i+2] = +y, [4*i+3] = -y
    neighbours: Vec<usize>,
    conc: Vec<f64>,
    dcdt: Vec<f64>,
    diffusion_constants: Vec<f64>,
    palette: SpeciesPalette,
}

impl<'g> Field<'g> {
    /// Creates a zero-concentration field over `geometry` and builds its neighbour table.
    /// Diffusion constants default to 1.
    pub fn new(
        geometry: &'g Geometry,
        n_species: usize,
        boundary_condition: BoundaryCondition,
    ) -> Result<Self, FieldError> {
        if n_species == 0 {
            return Err(FieldError::NoSpecies);
        }
        let n_pixels = geometry.pixel_count();
        debug!(
            "Field: {} species over {} pixels, {} boundary",
            n_species, n_pixels, boundary_condition
        );

        let neighbours = build_neighbour_table(geometry, boundary_condition);
        let n_slots = n_species * (n_pixels + N_BOUNDARY_SLOTS);

        Ok(Self {
            geometry,
            n_species,
            n_pixels,
            boundary_condition,
            neighbours,
            conc: vec![0.0; n_slots],
            dcdt: vec![0.0; n_slots],
            diffusion_constants: vec![1.0; n_species],
            palette: SpeciesPalette::with_len(n_species),
        })
    }

    pub fn species_count(&self) -> usize {
        self.n_species
    }

    pub fn pixel_count(&self) -> usize {
        self.n_pixels
    }

    pub fn boundary_condition(&self) -> BoundaryCondition {
        self.boundary_condition
    }

    /// Pixel index of the shared exterior slot.
    pub fn exterior_index(&self) -> usize {
        self.n_pixels
    }

    /// The four neighbour indices (+x, -x, +y, -y) of pixel `i`.
    pub fn neighbours(&self, i: usize) -> [usize; 4] {
        let n = &self.neighbours[4 * i..4 * i + 4];
        [n[0], n[1], n[2], n[3]]
    }

    /// Full concentration buffer, including the exterior slots.
    pub fn conc(&self) -> &[f64] {
        &self.conc
    }

    /// Concentrations (mutable) and the last `dcdt`, borrowed together so a driver
    /// can advance one from the other.
    pub fn conc_and_dcdt_mut(&mut self) -> (&mut [f64], &[f64]) {
        (&mut self.conc, &self.dcdt)
    }

    /// Result of the last [`Field::diffusion_op`], same layout as [`Field::conc`].
    pub fn dcdt(&self) -> &[f64] {
        &self.dcdt
    }

    pub fn concentration(&self, pixel_index: usize, species_index: usize) -> f64 {
        self.check_species(species_index);
        assert!(pixel_index <= self.n_pixels, "pixel index {} out of range", pixel_index);
        self.conc[self.n_species * pixel_index + species_index]
    }

    pub fn set_concentration(&mut self, pixel_index: usize, species_index: usize, value: f64) {
        self.check_species(species_index);
        assert!(pixel_index < self.n_pixels, "pixel index {} out of range", pixel_index);
        self.conc[self.n_species * pixel_index + species_index] = value;
    }

    /// Sets the exterior value seen by Dirichlet boundary pixels.
    pub fn set_boundary_concentration(&mut self, species_index: usize, value: f64) {
        self.check_species(species_index);
        self.conc[self.n_species * self.n_pixels + species_index] = value;
    }

    pub fn diffusion_constants(&self) -> &[f64] {
        &self.diffusion_constants
    }

    pub fn set_diffusion_constant(&mut self, species_index: usize, value: f64) {
        self.check_species(species_index);
        self.diffusion_constants[species_index] = value;
    }

    pub fn palette(&self) -> &SpeciesPalette {
        &self.palette
    }

    /// Replaces the display colours. The palette must cover every species.
    pub fn set_palette(&mut self, palette: SpeciesPalette) -> Result<(), FieldError> {
        if palette.len() < self.n_species {
            return Err(FieldError::SpeciesCountMismatch {
                expected: self.n_species,
                found: palette.len(),
            });
        }
        self.palette = palette;
        Ok(())
    }

    /// Sets the concentration of one species to `value` at every compartment pixel.
    /// The exterior slot is left untouched.
    pub fn set_constant_concentration(&mut self, species_index: usize, value: f64) {
        self.check_species(species_index);
        let n = self.n_species;
        for pixel in self.conc[..n * self.n_pixels].chunks_exact_mut(n) {
            pixel[species_index] = value;
        }
    }

    /// Imports an intensity image as the concentration of one species.
    ///
    /// Intensities are normalised to `[0, 1]` using the minimum and maximum of the
    /// whole image, not just the compartment pixels. `scale_factor` is accepted but
    /// not applied yet. An image with a single intensity sets the species to zero.
    pub fn import_concentration(
        &mut self,
        species_index: usize,
        image: &GrayImage,
        scale_factor: f64,
    ) -> Result<(), FieldError> {
        self.check_species(species_index);
        debug!(
            "Importing concentration of species {} (scale factor {} not applied)",
            species_index, scale_factor
        );
        let expected = self.geometry.image_size();
        if image.dimensions() != expected {
            return Err(FieldError::ImageSizeMismatch {
                expected,
                found: image.dimensions(),
            });
        }

        let (min, max) = image
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        if max <= min {
            warn!(
                "Concentration image for species {} has a single intensity ({}); setting it to zero.",
                species_index, min
            );
            self.set_constant_concentration(species_index, 0.0);
            return Ok(());
        }

        let range = f64::from(max - min);
        let n = self.n_species;
        for (i, p) in self.geometry.pixels().iter().enumerate() {
            let intensity = image.get_pixel(p.x, p.y).0[0];
            self.conc[n * i + species_index] = f64::from(intensity - min) / range;
        }
        Ok(())
    }

    /// Computes `dcdt` from the current concentrations using the 5-point Laplacian
    /// with unit pixel spacing. Only compartment entries of `dcdt` are written.
    pub fn diffusion_op(&mut self) {
        let n = self.n_species;
        let conc = &self.conc;
        let diffusion_constants = &self.diffusion_constants;

        self.dcdt[..n * self.n_pixels]
            .par_chunks_mut(n)
            .zip(self.neighbours.par_chunks(4))
            .enumerate()
            .for_each(|(i, (dcdt, nn))| {
                let index = n * i;
                let xup = n * nn[0];
                let xdn = n * nn[1];
                let yup = n * nn[2];
                let ydn = n * nn[3];
                for s in 0..n {
                    dcdt[s] = diffusion_constants[s]
                        * (conc[xup + s] + conc[xdn + s] + conc[yup + s] + conc[ydn + s]
                            - 4.0 * conc[index + s]);
                }
            });
    }

    /// Mean concentration of one species over the compartment, `None` if it has no pixels.
    pub fn mean_concentration(&self, species_index: usize) -> Option<f64> {
        self.check_species(species_index);
        if self.n_pixels == 0 {
            return None;
        }
        let sum: f64 = self.conc[..self.n_species * self.n_pixels]
            .iter()
            .skip(species_index)
            .step_by(self.n_species)
            .sum();
        Some(sum / self.n_pixels as f64)
    }

    /// Renders the given species over the compartment, each rescaled to its own
    /// maximum and tinted with its palette colour. Contributions add up per channel,
    /// saturating at 255. Pixels outside the compartment are fully transparent.
    pub fn concentration_image_for(&self, species_indices: &[usize]) -> RgbaImage {
        for &s in species_indices {
            self.check_species(s);
        }
        let (width, height) = self.geometry.image_size();
        let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        if species_indices.is_empty() {
            return img;
        }
        let n = self.n_species;
        let pixel_conc = &self.conc[..n * self.n_pixels];

        let max_conc: Vec<f64> = species_indices
            .iter()
            .map(|&s| {
                pixel_conc
                    .iter()
                    .skip(s)
                    .step_by(n)
                    .fold(MIN_DISPLAY_MAX, |acc, &c| acc.max(c))
            })
            .collect();

        let colours: Vec<Rgba<u8>> = pixel_conc
            .par_chunks(n)
            .map(|pixel| {
                let mut rgb = [0u32; 3];
                for (&s, &max) in species_indices.iter().zip(&max_conc) {
                    let c = pixel[s] / max;
                    let colour = self.palette.colour(s);
                    for (channel, &value) in rgb.iter_mut().zip(&colour) {
                        *channel += (f64::from(value) * c * DISPLAY_OPACITY) as u32;
                    }
                }
                Rgba([
                    rgb[0].min(255) as u8,
                    rgb[1].min(255) as u8,
                    rgb[2].min(255) as u8,
                    255,
                ])
            })
            .collect();

        for (p, colour) in self.geometry.pixels().iter().zip(colours) {
            img.put_pixel(p.x, p.y, colour);
        }
        img
    }

    /// Renders a single species.
    pub fn concentration_image_of(&self, species_index: usize) -> RgbaImage {
        self.concentration_image_for(&[species_index])
    }

    /// Renders all species superimposed.
    pub fn concentration_image(&self) -> RgbaImage {
        let all: Vec<usize> = (0..self.n_species).collect();
        self.concentration_image_for(&all)
    }

    #[inline(always)]
    fn check_species(&self, species_index: usize) {
        assert!(
            species_index < self.n_species,
            "species index {} out of range (field has {} species)",
            species_index,
            self.n_species
        );
    }
}

/// Builds the neighbour table of every compartment pixel. Missing neighbours point
/// at the exterior slot (Dirichlet) or at the pixel itself (Neumann).
fn build_neighbour_table(geometry: &Geometry, boundary_condition: BoundaryCondition) -> Vec<usize> {
    let (width, height) = geometry.image_size();
    let (width, height) = (i64::from(width), i64::from(height));
    // Bijective within the image bounds
    let key = |x: i64, y: i64| -> Option<i64> {
        (x >= 0 && x < width && y >= 0 && y < height).then_some(x * height + y)
    };

    let pixels = geometry.pixels();
    let mut index: FxHashMap<i64, usize> =
        FxHashMap::with_capacity_and_hasher(pixels.len(), Default::default());
    for (i, p) in pixels.iter().enumerate() {
        index.insert(i64::from(p.x) * height + i64::from(p.y), i);
    }

    let outside = pixels.len();
    let mut neighbours = Vec::with_capacity(4 * pixels.len());
    for (i, p) in pixels.iter().enumerate() {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        for (dx, dy) in NEIGHBOUR_OFFSETS {
            let found = key(x + dx, y + dy).and_then(|k| index.get(&k).copied());
            neighbours.push(match (found, boundary_condition) {
                (Some(j), _) => j,
                (None, BoundaryCondition::Dirichlet) => outside,
                (None, BoundaryCondition::Neumann) => i,
            });
        }
    }
    neighbours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::{split_image, BLUE, RED};
    use approx::assert_relative_eq;
    use image::Luma;

    fn full_geometry(width: u32, height: u32) -> Geometry {
        Geometry::from_image(&split_image(width, height, width), RED)
    }

    fn index_of(geom: &Geometry, x: u32, y: u32) -> usize {
        geom.pixels()
            .iter()
            .position(|p| p.x == x && p.y == y)
            .expect("pixel not in compartment")
    }

    #[test]
    fn parses_boundary_condition_names() {
        assert_eq!("Neumann".parse::<BoundaryCondition>(), Ok(BoundaryCondition::Neumann));
        assert_eq!(" dirichlet ".parse::<BoundaryCondition>(), Ok(BoundaryCondition::Dirichlet));
        assert_eq!(
            "periodic".parse::<BoundaryCondition>(),
            Err(FieldError::UnsupportedBoundaryCondition("periodic".to_string()))
        );
    }

    #[test]
    fn rejects_zero_species() {
        let geom = full_geometry(2, 2);
        assert_eq!(
            Field::new(&geom, 0, BoundaryCondition::Neumann).unwrap_err(),
            FieldError::NoSpecies
        );
    }

    #[test]
    fn buffers_have_exterior_slot() {
        let geom = full_geometry(3, 2);
        let field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        assert_eq!(field.pixel_count(), 6);
        assert_eq!(field.conc().len(), 2 * 7);
        assert_eq!(field.dcdt().len(), 2 * 7);
        assert_eq!(field.diffusion_constants(), &[1.0, 1.0]);
        assert_eq!(field.exterior_index(), 6);
    }

    #[test]
    fn interior_neighbours_ignore_boundary_condition() {
        let geom = full_geometry(3, 3);
        let centre = index_of(&geom, 1, 1);
        let expected = [
            index_of(&geom, 2, 1),
            index_of(&geom, 0, 1),
            index_of(&geom, 1, 2),
            index_of(&geom, 1, 0),
        ];
        for bc in [BoundaryCondition::Dirichlet, BoundaryCondition::Neumann] {
            let field = Field::new(&geom, 1, bc).unwrap();
            assert_eq!(field.neighbours(centre), expected);
        }
    }

    #[test]
    fn missing_neighbours_follow_boundary_condition() {
        // Left two columns of a 4x3 image; the right column and image edge are outside
        let geom = Geometry::from_image(&split_image(4, 3, 2), RED);
        let corner = index_of(&geom, 1, 0);

        let neumann = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        assert_eq!(
            neumann.neighbours(corner),
            [corner, index_of(&geom, 0, 0), index_of(&geom, 1, 1), corner]
        );

        let dirichlet = Field::new(&geom, 1, BoundaryCondition::Dirichlet).unwrap();
        let outside = dirichlet.exterior_index();
        assert_eq!(
            dirichlet.neighbours(corner),
            [outside, index_of(&geom, 0, 0), index_of(&geom, 1, 1), outside]
        );
        for i in 0..dirichlet.pixel_count() {
            assert!(dirichlet.neighbours(i).iter().all(|&j| j <= outside));
        }
    }

    #[test]
    fn neumann_uniform_field_has_zero_flux() {
        let mut img = split_image(6, 5, 4);
        // Irregular shape: notch and a detached pixel
        img.put_pixel(2, 2, BLUE);
        img.put_pixel(5, 4, RED);
        let geom = Geometry::from_image(&img, RED);
        let mut field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        field.set_diffusion_constant(1, 0.3);
        field.set_constant_concentration(0, 5.0);
        field.set_constant_concentration(1, -1.5);
        field.diffusion_op();
        assert!(field.dcdt().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn dirichlet_exterior_drives_boundary_pixels_only() {
        let geom = full_geometry(4, 4);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Dirichlet).unwrap();
        field.set_diffusion_constant(0, 0.5);
        field.set_constant_concentration(0, 2.0);
        field.set_boundary_concentration(0, 5.0);
        field.diffusion_op();

        for (i, p) in geom.pixels().iter().enumerate() {
            let missing = [p.x == 0, p.x == 3, p.y == 0, p.y == 3]
                .iter()
                .filter(|&&edge| edge)
                .count();
            // Each missing neighbour contributes D * (exterior - interior)
            assert_relative_eq!(field.dcdt()[i], 0.5 * missing as f64 * 3.0);
        }
        // The exterior slot itself is not touched
        assert_eq!(field.dcdt()[field.exterior_index()], 0.0);
        assert_eq!(field.concentration(field.exterior_index(), 0), 5.0);
    }

    #[test]
    fn diffusion_op_leaves_concentrations_alone() {
        let geom = full_geometry(3, 3);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        field.set_concentration(4, 0, 1.0);
        let before = field.conc().to_vec();
        field.diffusion_op();
        let first = field.dcdt().to_vec();
        field.diffusion_op();
        assert_eq!(field.conc(), &before[..]);
        assert_eq!(field.dcdt(), &first[..]);
        assert_relative_eq!(first.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_concentration_and_mean() {
        let geom = Geometry::from_image(&split_image(5, 4, 3), RED);
        let mut field = Field::new(&geom, 3, BoundaryCondition::Dirichlet).unwrap();
        field.set_boundary_concentration(1, 9.0);
        field.set_constant_concentration(1, 0.7);
        assert_relative_eq!(field.mean_concentration(1).unwrap(), 0.7);
        assert_eq!(field.mean_concentration(0), Some(0.0));
        // Exterior slot and other species are untouched
        assert_eq!(field.concentration(field.exterior_index(), 1), 9.0);
        assert_eq!(field.mean_concentration(2), Some(0.0));
    }

    #[test]
    fn empty_compartment_has_no_mean() {
        let geom = Geometry::from_image(&split_image(3, 3, 3), BLUE);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        field.set_constant_concentration(0, 4.0);
        field.diffusion_op();
        assert_eq!(field.mean_concentration(0), None);
        assert_eq!(field.conc().len(), 1);
    }

    #[test]
    #[should_panic(expected = "species index 2 out of range")]
    fn species_out_of_range_panics() {
        let geom = full_geometry(2, 2);
        let mut field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        field.set_constant_concentration(2, 1.0);
    }

    #[test]
    fn import_normalises_against_whole_image() {
        let geom = full_geometry(3, 2);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(10 + 20 * x + 5 * y) as u8]));
        field.import_concentration(0, &img, 1.0).unwrap();

        assert_relative_eq!(field.concentration(index_of(&geom, 0, 0), 0), 0.0);
        assert_relative_eq!(field.concentration(index_of(&geom, 2, 1), 0), 1.0);
        assert_relative_eq!(field.concentration(index_of(&geom, 1, 0), 0), 20.0 / 45.0);

        // Only the left column is in this compartment, but the range is still global
        let left = Geometry::from_image(&split_image(3, 2, 1), RED);
        let mut field = Field::new(&left, 1, BoundaryCondition::Neumann).unwrap();
        field.import_concentration(0, &img, 1.0).unwrap();
        assert_relative_eq!(field.concentration(0, 0), 0.0);
        assert_relative_eq!(field.concentration(1, 0), 5.0 / 45.0);
    }

    #[test]
    fn import_ignores_scale_factor() {
        let geom = full_geometry(2, 1);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 200 }]));
        field.import_concentration(0, &img, 3.0).unwrap();
        assert_relative_eq!(field.concentration(index_of(&geom, 0, 0), 0), 0.0);
        assert_relative_eq!(field.concentration(index_of(&geom, 1, 0), 0), 1.0);
    }

    #[test]
    fn import_of_flat_image_falls_back_to_zero() {
        let geom = full_geometry(2, 2);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        field.set_constant_concentration(0, 3.0);
        field
            .import_concentration(0, &GrayImage::from_pixel(2, 2, Luma([77])), 1.0)
            .unwrap();
        assert!(field.conc()[..4].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn import_rejects_mismatched_image() {
        let geom = full_geometry(2, 2);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        assert_eq!(
            field.import_concentration(0, &GrayImage::new(3, 2), 1.0),
            Err(FieldError::ImageSizeMismatch { expected: (2, 2), found: (3, 2) })
        );
    }

    #[test]
    fn concentration_image_scales_and_tints() {
        let geom = Geometry::from_image(&split_image(3, 2, 2), RED);
        let mut field = Field::new(&geom, 1, BoundaryCondition::Neumann).unwrap();
        field.set_palette(SpeciesPalette::new(vec![[200, 100, 0]])).unwrap();
        field.set_concentration(0, 0, 2.0);
        field.set_concentration(1, 0, 1.0);

        let img = field.concentration_image_of(0);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(0, 0), Rgba([150, 75, 0, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgba([75, 37, 0, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
        // Outside the compartment
        assert_eq!(*img.get_pixel(2, 1), Rgba([0, 0, 0, 0]));
        assert_eq!(img, field.concentration_image());
    }

    #[test]
    fn concentration_image_blends_and_saturates() {
        let geom = full_geometry(2, 1);
        let mut field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        field
            .set_palette(SpeciesPalette::new(vec![[200, 0, 0], [200, 40, 0]]))
            .unwrap();
        field.set_constant_concentration(0, 1.0);
        field.set_constant_concentration(1, 4.0);

        let img = field.concentration_image();
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 30, 0, 255]));
        // A subset ignores the other species
        assert_eq!(*field.concentration_image_for(&[1]).get_pixel(1, 0), Rgba([150, 30, 0, 255]));
    }

    #[test]
    fn empty_species_list_renders_transparent() {
        let geom = full_geometry(2, 2);
        let mut field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        field.set_constant_concentration(0, 1.0);
        let img = field.concentration_image_for(&[]);
        assert_eq!(img.dimensions(), (2, 2));
        assert!(img.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn all_zero_field_renders_black() {
        let geom = full_geometry(2, 2);
        let field = Field::new(&geom, 3, BoundaryCondition::Neumann).unwrap();
        assert!(field.concentration_image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn palette_must_cover_species() {
        let geom = full_geometry(2, 2);
        let mut field = Field::new(&geom, 2, BoundaryCondition::Neumann).unwrap();
        assert_eq!(
            field.set_palette(SpeciesPalette::new(vec![[1, 2, 3]])),
            Err(FieldError::SpeciesCountMismatch { expected: 2, found: 1 })
        );
        assert!(field.palette().len() >= 2);
    }
}

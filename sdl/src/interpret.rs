use std::{
    io::{self, Read, Seek},
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, SeedableRng};
use raycore::{
    camera::Camera,
    lighting::{AreaShape, Attenuation, Light},
    material::{Color, Material, Texture, TexturePlane},
    math::{Point3, Vector3},
    object::{Cylinder, HalfSpace, Object, Polyhedron, Shape, Sphere, Torus, Transform},
    scene::{Scene, SceneOptions},
};
use thiserror::Error;

use crate::tokenize::{Spanned, Token, TokenizeError, Tokenizer};

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizeError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load texture image: {0}")]
    Image(#[from] image::ImageError),

    #[error("unexpected end of file, expected {0}")]
    UnexpectedEof(&'static str),

    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: &'static str,
        found: Token,
        line: usize,
    },

    #[error("line {line}: unknown texture kind `{name}`")]
    UnknownTexture { name: String, line: usize },

    #[error("line {line}: unknown object kind `{name}`")]
    UnknownObject { name: String, line: usize },

    #[error("line {line}: unknown area light shape `{name}`")]
    UnknownAreaShape { name: String, line: usize },

    #[error("line {line}: {what} index {index} out of range, {len} defined")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
        line: usize,
    },

    #[error("line {line}: invalid {what} `{value}`")]
    InvalidValue {
        what: &'static str,
        value: f64,
        line: usize,
    },
}

/// The interpreter reads the positional scene description: camera, lights,
/// textures, materials and objects, in that order.
pub struct Interpreter {
    tokens: Vec<Spanned>,
    pos: usize,
    base_dir: PathBuf,
    options: SceneOptions,
}

impl Interpreter {
    /// Create a new interpreter. This will instantiate a `Tokenizer` and tokenize the input.
    pub fn new<R: Read + Seek>(reader: R) -> Result<Self, InterpretError> {
        Ok(Interpreter {
            tokens: Tokenizer::new(reader).tokenize()?,
            pos: 0,
            base_dir: PathBuf::new(),
            options: SceneOptions::default(),
        })
    }

    /// Directory that relative texture file names are resolved against.
    pub fn with_base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Options the built scene renders with. The seed also drives the
    /// construction of every sampler.
    pub fn with_options(mut self, options: SceneOptions) -> Self {
        self.options = options;
        self
    }

    /// Start execution of the interpreter.
    pub fn run(mut self) -> Result<Scene, InterpretError> {
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let sets = self.options.sample_sets;

        let (mut camera, samples) = self.read_camera()?;
        camera.set_samples(samples, sets, &mut rng);

        // the first light is the ambient light
        let num_lights = self.read_count("light count")?;
        if num_lights == 0 {
            return Err(self.invalid_previous("light count, the ambient light is required"));
        }
        self.read_point()?;
        let ambient = self.read_color()?;
        self.read_attenuation()?;

        let mut lights = Vec::with_capacity(num_lights - 1);
        for _ in 1..num_lights {
            let position = self.read_point()?;
            let color = self.read_color()?;
            let attenuation = self.read_attenuation()?;

            let light = if self.eat_keyword("area") {
                let line = self.line();
                let name = self.read_word("area light shape")?;
                let shape = AreaShape::from_name(&name)
                    .ok_or(InterpretError::UnknownAreaShape { name, line })?;
                let samples = self.read_count("area light samples")?;
                let size = self.read_number("area light size")?;
                Light::area(position, color, attenuation, shape, samples, size, sets, &mut rng)
            } else {
                Light::point(position, color, attenuation)
            };
            lights.push(light);
        }

        let num_textures = self.read_count("texture count")?;
        let textures = (0..num_textures)
            .map(|_| self.read_texture())
            .collect::<Result<Vec<_>, _>>()?;

        let num_materials = self.read_count("material count")?;
        let materials = (0..num_materials)
            .map(|_| self.read_material())
            .collect::<Result<Vec<_>, _>>()?;

        let num_objects = self.read_count("object count")?;
        let mut objects = Vec::with_capacity(num_objects);
        for id in 0..num_objects {
            objects.push(self.read_object(id, textures.len(), materials.len())?);
        }

        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(InterpretError::UnexpectedToken {
                expected: "end of file",
                found: extra.token.clone(),
                line: extra.line,
            });
        }

        log::info!(
            "scene has {} light(s), {} texture(s), {} material(s), {} object(s)",
            lights.len(),
            textures.len(),
            materials.len(),
            objects.len()
        );

        Ok(Scene {
            camera,
            ambient,
            lights,
            textures,
            materials,
            objects,
            options: self.options,
        })
    }

    fn read_camera(&mut self) -> Result<(Camera, usize), InterpretError> {
        let position = self.read_point()?;
        let look_at = self.read_point()?;
        let up = self.read_vector()?;
        let fovy = self.read_number("field of view")?;
        if fovy <= 0. || fovy >= 180. {
            return Err(self.invalid_previous("field of view"));
        }

        let mut camera = Camera::new(position, look_at, up, fovy, 800, 600);
        let mut samples = 1;
        loop {
            if self.eat_keyword("samples") {
                samples = self.read_count("camera samples")?;
            } else if self.eat_keyword("lens") {
                camera.lens_radius = self.read_number("lens radius")?;
                camera.focal_distance = self.read_number("focal distance")?;
            } else {
                break;
            }
        }

        Ok((camera, samples))
    }

    fn read_texture(&mut self) -> Result<Texture, InterpretError> {
        let line = self.line();
        let kind = self.read_word("texture kind")?;

        Ok(match kind.as_str() {
            "solid" => Texture::Solid(self.read_color()?),
            "checker" => {
                let color1 = self.read_color()?;
                let color2 = self.read_color()?;
                let scale = self.read_number("checker scale")?;
                if scale <= 0. {
                    return Err(self.invalid_previous("checker scale"));
                }
                Texture::Checker {
                    scale,
                    color1,
                    color2,
                }
            }
            "texmap" => {
                let file = self.read_word("texture file")?;
                let path = self.base_dir.join(file);
                let p0 = self.read_plane()?;
                let p1 = self.read_plane()?;

                log::debug!("loading texture {}", path.display());
                Texture::Map {
                    image: image::open(&path)?.to_rgb8(),
                    p0,
                    p1,
                }
            }
            _ => return Err(InterpretError::UnknownTexture { name: kind, line }),
        })
    }

    fn read_material(&mut self) -> Result<Material, InterpretError> {
        Ok(Material {
            ambient: self.read_number("ambient coefficient")?,
            diffuse: self.read_number("diffuse coefficient")?,
            specular: self.read_number("specular coefficient")?,
            shininess: self.read_number("shininess")?,
            reflective: self.read_number("reflective coefficient")?,
            transmissive: self.read_number("transmissive coefficient")?,
            ior: {
                let ior = self.read_number("index of refraction")?;
                if ior <= 0. {
                    return Err(self.invalid_previous("index of refraction"));
                }
                ior
            },
        })
    }

    fn read_object(&mut self, id: usize, textures: usize, materials: usize) -> Result<Object, InterpretError> {
        let texture = self.read_index("texture", textures)?;
        let material = self.read_index("material", materials)?;

        let line = self.line();
        let kind = self.read_word("object kind")?;
        let (shape, position, rotation) = match kind.as_str() {
            "sphere" => {
                let center = self.read_point()?;
                let radius = self.read_positive("sphere radius")?;
                (Shape::Sphere(Sphere::new(radius)), center, Vector3::default())
            }
            "polyhedron" => {
                let count = self.read_count("face count")?;
                let mut faces = Vec::with_capacity(count);
                for _ in 0..count {
                    let [a, b, c, d] = self.read_numbers::<4>("face plane")?;
                    if Vector3::new(a, b, c).magnitude() <= 0. {
                        return Err(self.invalid_previous("face normal"));
                    }
                    faces.push(HalfSpace::new(a, b, c, d));
                }
                (Shape::Polyhedron(Polyhedron::new(faces)), Point3::origin(), Vector3::default())
            }
            "torus" => {
                let radius = self.read_positive("torus radius")?;
                let thickness = self.read_positive("torus thickness")?;
                let center = self.read_point()?;
                let rotation = self.read_vector()?;
                (Shape::Torus(Torus::new(radius, thickness)), center, rotation)
            }
            "cylinder" => {
                let radius = self.read_positive("cylinder radius")?;
                let bottom = self.read_number("cylinder bottom")?;
                let top = self.read_number("cylinder top")?;
                let center = self.read_point()?;
                let rotation = self.read_vector()?;
                (Shape::Cylinder(Cylinder::new(radius, bottom, top)), center, rotation)
            }
            _ => return Err(InterpretError::UnknownObject { name: kind, line }),
        };

        let mut scale = Vector3::new(1., 1., 1.);
        let mut acceleration = Vector3::default();
        loop {
            if self.eat_keyword("scale") {
                scale = self.read_vector()?;
                if scale.x == 0. || scale.y == 0. || scale.z == 0. {
                    return Err(self.invalid_previous("scale"));
                }
            } else if self.eat_keyword("acceleration") {
                acceleration = self.read_vector()?;
            } else {
                break;
            }
        }

        let mut transform = Transform::new(position, rotation, scale);
        transform.acceleration = acceleration;

        Ok(Object::new(id, shape, texture, material).with_transform(transform))
    }

    /// Line of the next token, or of the last one at the end of the input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn next(&mut self, expected: &'static str) -> Result<&Spanned, InterpretError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or(InterpretError::UnexpectedEof(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn invalid_previous(&self, what: &'static str) -> InterpretError {
        let previous = self.pos.checked_sub(1).and_then(|i| self.tokens.get(i));
        InterpretError::InvalidValue {
            what,
            value: match previous {
                Some(Spanned {
                    token: Token::Number(n),
                    ..
                }) => *n,
                _ => f64::NAN,
            },
            line: previous.map_or(1, |t| t.line),
        }
    }

    /// Consume the next token if it is the identifier `keyword`.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Identifier(ident),
                ..
            }) if ident == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn read_number(&mut self, expected: &'static str) -> Result<f64, InterpretError> {
        match self.next(expected)? {
            Spanned {
                token: Token::Number(n),
                ..
            } => Ok(*n),
            Spanned { token, line } => Err(InterpretError::UnexpectedToken {
                expected,
                found: token.clone(),
                line: *line,
            }),
        }
    }

    fn read_numbers<const N: usize>(&mut self, expected: &'static str) -> Result<[f64; N], InterpretError> {
        let mut out = [0.; N];
        for v in out.iter_mut() {
            *v = self.read_number(expected)?;
        }
        Ok(out)
    }

    fn read_positive(&mut self, what: &'static str) -> Result<f64, InterpretError> {
        let n = self.read_number(what)?;
        if n > 0. {
            Ok(n)
        } else {
            Err(self.invalid_previous(what))
        }
    }

    /// A non-negative whole number.
    fn read_count(&mut self, what: &'static str) -> Result<usize, InterpretError> {
        let n = self.read_number(what)?;
        if n < 0. || n.fract() != 0. {
            return Err(self.invalid_previous(what));
        }
        Ok(n as usize)
    }

    fn read_index(&mut self, what: &'static str, len: usize) -> Result<usize, InterpretError> {
        let index = self.read_count(what)?;
        if index >= len {
            return Err(InterpretError::IndexOutOfRange {
                what,
                index,
                len,
                line: self.line(),
            });
        }
        Ok(index)
    }

    /// An identifier or a quoted string.
    fn read_word(&mut self, expected: &'static str) -> Result<String, InterpretError> {
        match self.next(expected)? {
            Spanned {
                token: Token::Identifier(s) | Token::String(s),
                ..
            } => Ok(s.clone()),
            Spanned { token, line } => Err(InterpretError::UnexpectedToken {
                expected,
                found: token.clone(),
                line: *line,
            }),
        }
    }

    fn read_point(&mut self) -> Result<Point3, InterpretError> {
        let [x, y, z] = self.read_numbers::<3>("point")?;
        Ok(Point3::new(x, y, z))
    }

    fn read_vector(&mut self) -> Result<Vector3, InterpretError> {
        let [x, y, z] = self.read_numbers::<3>("vector")?;
        Ok(Vector3::new(x, y, z))
    }

    fn read_color(&mut self) -> Result<Color, InterpretError> {
        let [r, g, b] = self.read_numbers::<3>("color")?;
        Ok(Color::new(r, g, b))
    }

    fn read_attenuation(&mut self) -> Result<Attenuation, InterpretError> {
        let [a, b, c] = self.read_numbers::<3>("attenuation")?;
        Ok(Attenuation::new(a, b, c))
    }

    fn read_plane(&mut self) -> Result<TexturePlane, InterpretError> {
        let [a, b, c, d] = self.read_numbers::<4>("texture plane")?;
        Ok(TexturePlane::new(a, b, c, d))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use raycore::object::Intersect;

    use super::*;

    const SCENE: &str = "
# camera
0 0 5   0 0 0   0 1 0   60
samples 4 lens 0.1 5

# lights
3
0 0 0   0.1 0.1 0.1   1 0 0
2 2 5   1 1 1   1 0.01 0
-2 2 5  1 1 1   1 0 0   area disk 9 0.5

# textures
2
solid 1 0 0
checker 1 1 1  0 0 0  0.5

# materials
1
0.2 0.8 0.5 32 0 0 1

# objects
4
0 0 sphere 0 0 0 1
1 0 polyhedron 6
   1 0 0 -1   -1 0 0 -1
   0 1 0 -1   0 -1 0 -1
   0 0 1 -1   0 0 -1 -1
   scale 2 1 1
0 0 torus 2 0.5  0 0 -3  90 0 0 acceleration 1 0 0
1 0 cylinder 1 -1 1  3 0 0  0 0 0
";

    fn read(src: &str) -> Result<Scene, InterpretError> {
        Interpreter::new(Cursor::new(src))?.run()
    }

    #[test]
    fn reads_full_scene() {
        let scene = read(SCENE).unwrap();

        assert_eq!(scene.camera.samples(), 4);
        assert_eq!(scene.camera.lens_radius, 0.1);
        assert_eq!(scene.camera.focal_distance, 5.);
        assert_eq!(scene.ambient, Color::new(0.1, 0.1, 0.1));

        assert_eq!(scene.lights.len(), 2);
        assert_eq!(scene.lights[0].area_shape, AreaShape::None);
        assert_eq!(scene.lights[0].attenuation, Attenuation::new(1., 0.01, 0.));
        assert_eq!(scene.lights[1].area_shape, AreaShape::Disk);
        assert_eq!(scene.lights[1].num_samples(), 9);

        assert_eq!(scene.textures.len(), 2);
        assert!(matches!(scene.textures[1], Texture::Checker { scale, .. } if scale == 0.5));
        assert_eq!(scene.materials[0].specular, 0.5);

        let kinds = scene.objects.iter().map(|o| o.shape.kind()).collect::<Vec<_>>();
        assert_eq!(kinds, ["sphere", "polyhedron", "torus", "cylinder"]);
        assert_eq!(scene.objects[1].transform.original_scale, Vector3::new(2., 1., 1.));
        assert_eq!(scene.objects[2].transform.acceleration, Vector3::new(1., 0., 0.));
        assert_eq!(scene.objects[3].texture, 1);
    }

    #[test]
    fn transforms_place_objects() {
        let scene = read(SCENE).unwrap();
        let ray = raycore::math::Ray::new(Point3::new(0., 0., 10.), Vector3::new(0., 0., -1.));

        // the scaled cube reaches x = 2
        let side = raycore::math::Ray::new(Point3::new(1.9, 0., 10.), Vector3::new(0., 0., -1.));
        assert!(scene.objects[1].intersect(&side, f64::INFINITY).is_some());

        // the torus is stood up facing +z at z = -3, so its hole lines up with the axis
        assert!(scene.objects[2].intersect(&ray, f64::INFINITY).is_none());
        let rim = raycore::math::Ray::new(Point3::new(0., 2., 10.), Vector3::new(0., 0., -1.));
        let hit = scene.objects[2].intersect(&rim, f64::INFINITY).unwrap();
        assert!((hit.t - 12.5).abs() < 1e-6);
    }

    #[test]
    fn reader_errors() {
        assert!(matches!(read(""), Err(InterpretError::UnexpectedEof(_))));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 60 1 0 0 0 1 1 1 1 0 0 1 solid 1 1 1 1 0.2 0.8 0 1 0 0 1 1 0 0 cone 1"),
            Err(InterpretError::UnknownObject { .. })
        ));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 60 1 0 0 0 1 1 1 1 0 0 1 solid 1 1 1 1 0.2 0.8 0 1 0 0 1 1 3 0 sphere 0 0 0 1"),
            Err(InterpretError::IndexOutOfRange { what: "texture", index: 3, .. })
        ));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 60 1 0 0 0 1 1 1 1 0 0 1 marble"),
            Err(InterpretError::UnknownTexture { .. })
        ));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 60 2 0 0 0 1 1 1 1 0 0 0 0 0 1 1 1 1 0 0 area cone 4 1"),
            Err(InterpretError::UnknownAreaShape { .. })
        ));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 60 0"),
            Err(InterpretError::InvalidValue { what, .. }) if what.starts_with("light count")
        ));
        assert!(matches!(
            read("0 0 5 0 0 0 0 1 0 sixty"),
            Err(InterpretError::UnexpectedToken { expected: "field of view", line: 1, .. })
        ));
    }

    #[test]
    fn missing_texture_image_is_an_error() {
        let result = Interpreter::new(Cursor::new(
            "0 0 5 0 0 0 0 1 0 60 1 0 0 0 1 1 1 1 0 0 1 texmap no_such_file.png 1 0 0 0 0 1 0 0",
        ))
        .unwrap()
        .with_base_dir(std::env::temp_dir())
        .run();

        assert!(matches!(result, Err(InterpretError::Image(_))));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let result = read("0 0 5 0 0 0 0 1 0 60 1 0 0 0 1 1 1 1 0 0 0 0 0 0 extra");
        assert!(matches!(
            result,
            Err(InterpretError::UnexpectedToken { expected: "end of file", .. })
        ));
    }
}

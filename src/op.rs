//! Symbolic operators: sums of coefficient-weighted products of primitive
//! symbols.
//!
//! Products are written left to right and act right to left, so the
//! rightmost symbol is applied to the state first.  Coefficients are
//! polynomials in the state labels and are evaluated on the initial state.
use std::{fmt, ops, str};
use std::collections::BTreeMap;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use super::error::{Error, Result};
use super::labels::Xlabel;
use super::radial_prod::RadialOp;
use super::spherical::{Harm, SphOp};

/// Operators defined directly on the X-space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intrinsic {
    /// `π`
    Pi,
    /// `[π×π]_{L=2}`
    PiPi2,
    /// `[π×π]_{L=4}`
    PiPi4,
    /// `[π×q×π]_{v=3,L=0}`
    PiqPi,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 4] = [
        Intrinsic::Pi, Intrinsic::PiPi2, Intrinsic::PiPi4, Intrinsic::PiqPi,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Intrinsic::Pi => "Xspace_Pi",
            Intrinsic::PiPi2 => "Xspace_PiPi2",
            Intrinsic::PiPi4 => "Xspace_PiPi4",
            Intrinsic::PiqPi => "Xspace_PiqPi",
        }
    }

    /// Angular momentum carried by the operator.
    pub fn am(self) -> i32 {
        match self {
            Intrinsic::Pi | Intrinsic::PiPi2 => 2,
            Intrinsic::PiPi4 => 4,
            Intrinsic::PiqPi => 0,
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single symbol of a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Radial(RadialOp),
    Sph(SphOp),
    X(Intrinsic),
}

impl Primitive {
    pub fn harm(v: i32, alpha: i32, l: i32) -> Result<Self> {
        Ok(Primitive::Sph(SphOp::Harm(Harm::new(v, alpha, l)?)))
    }

    /// Angular momentum carried by the symbol.
    pub fn am(self) -> i32 {
        match self {
            Primitive::Radial(_) => 0,
            Primitive::Sph(SphOp::Harm(y)) => y.l,
            Primitive::Sph(_) => 0,
            Primitive::X(x) => x.am(),
        }
    }

    /// `(K + T + v) mod 2`.  SU(1,1) generators are quadratic in `β` and
    /// `d/dβ`, and the intrinsics are even.
    pub fn parity(self) -> i32 {
        match self {
            Primitive::Radial(op) => match op.kt() {
                Some((k, t)) => (k + t).rem_euclid(2),
                None => 0,
            },
            Primitive::Sph(SphOp::Harm(y)) => y.v % 2,
            Primitive::Sph(_) => 0,
            Primitive::X(_) => 0,
        }
    }

    /// Whether the symbol mixes angular momenta so that the operator must
    /// be represented across all `L` at once.
    pub fn is_wild(self) -> bool {
        match self {
            Primitive::X(Intrinsic::Pi) |
            Primitive::X(Intrinsic::PiPi2) |
            Primitive::X(Intrinsic::PiPi4) => true,
            _ => false,
        }
    }
}

impl From<RadialOp> for Primitive {
    fn from(op: RadialOp) -> Self {
        Primitive::Radial(op)
    }
}

impl From<SphOp> for Primitive {
    fn from(op: SphOp) -> Self {
        Primitive::Sph(op)
    }
}

impl From<Harm> for Primitive {
    fn from(y: Harm) -> Self {
        Primitive::Sph(SphOp::Harm(y))
    }
}

impl From<Intrinsic> for Primitive {
    fn from(x: Intrinsic) -> Self {
        Primitive::X(x)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Primitive::Radial(op) => op.fmt(f),
            Primitive::Sph(op) => op.fmt(f),
            Primitive::X(x) => x.fmt(f),
        }
    }
}

impl str::FromStr for Primitive {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("Radial_") {
            s.parse().map(Primitive::Radial)
        } else if s.starts_with("Sp") {
            s.parse().map(Primitive::Sph)
        } else {
            Intrinsic::ALL.iter()
                .cloned()
                .find(|x| x.symbol() == s)
                .map(Primitive::X)
                .ok_or_else(|| Error::UndefinedOperator(s.to_owned()))
        }
    }
}

/// State labels that may appear in a coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    Number,
    Seniority,
    Alfa,
    Angmom,
}

impl Param {
    pub const ALL: [Param; 4] = [
        Param::Number, Param::Seniority, Param::Alfa, Param::Angmom,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Param::Number => "NUMBER",
            Param::Seniority => "SENIORITY",
            Param::Alfa => "ALFA",
            Param::Angmom => "ANGMOM",
        }
    }

    pub fn value(self, x: &Xlabel) -> f64 {
        (match self {
            Param::Number => x.nu,
            Param::Seniority => x.v,
            Param::Alfa => x.alpha,
            Param::Angmom => x.l,
        }) as f64
    }

    fn index(self) -> usize {
        match self {
            Param::Number => 0,
            Param::Seniority => 1,
            Param::Alfa => 2,
            Param::Angmom => 3,
        }
    }
}

/// Exponents of `NUMBER`, `SENIORITY`, `ALFA`, `ANGMOM`.
pub type Powers = [u32; 4];

/// Polynomial in the state labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coef {
    monomials: BTreeMap<Powers, f64>,
}

impl Coef {
    pub fn zero() -> Self {
        Default::default()
    }

    pub fn constant(c: f64) -> Self {
        Self::monomial(c, [0; 4])
    }

    pub fn param(p: Param) -> Self {
        let mut powers = [0; 4];
        powers[p.index()] = 1;
        Self::monomial(1.0, powers)
    }

    pub fn monomial(c: f64, powers: Powers) -> Self {
        let mut r = Self::zero();
        r.add_monomial(c, powers);
        r
    }

    fn add_monomial(&mut self, c: f64, powers: Powers) {
        if c == 0.0 {
            return;
        }
        let remove = {
            let e = self.monomials.entry(powers).or_insert(0.0);
            *e += c;
            *e == 0.0
        };
        if remove {
            self.monomials.remove(&powers);
        }
    }

    pub fn monomials(&self) -> &BTreeMap<Powers, f64> {
        &self.monomials
    }

    pub fn is_zero(&self) -> bool {
        self.monomials.is_empty()
    }

    /// The value if the coefficient does not depend on the state.
    pub fn as_const(&self) -> Option<f64> {
        match self.monomials.len() {
            0 => Some(0.0),
            1 => self.monomials.get(&[0; 4]).cloned(),
            _ => None,
        }
    }

    pub fn eval(&self, x: &Xlabel) -> f64 {
        self.monomials.iter()
            .map(|(powers, &c)| {
                Param::ALL.iter().zip(powers).fold(c, |acc, (p, &n)| {
                    acc * p.value(x).powi(n as i32)
                })
            })
            .sum()
    }

    pub fn pow(&self, n: u32) -> Self {
        (0 .. n).fold(Coef::constant(1.0), |acc, _| &acc * self)
    }
}

impl From<f64> for Coef {
    fn from(c: f64) -> Self {
        Coef::constant(c)
    }
}

impl From<Param> for Coef {
    fn from(p: Param) -> Self {
        Coef::param(p)
    }
}

impl<'a, 'b> ops::Add<&'b Coef> for &'a Coef {
    type Output = Coef;
    fn add(self, other: &'b Coef) -> Coef {
        let mut r = self.clone();
        for (&powers, &c) in &other.monomials {
            r.add_monomial(c, powers);
        }
        r
    }
}

impl<'a, 'b> ops::Mul<&'b Coef> for &'a Coef {
    type Output = Coef;
    fn mul(self, other: &'b Coef) -> Coef {
        let mut r = Coef::zero();
        for (p1, &c1) in &self.monomials {
            for (p2, &c2) in &other.monomials {
                let mut powers = *p1;
                for (e, n) in powers.iter_mut().zip(p2) {
                    *e += n;
                }
                r.add_monomial(c1 * c2, powers);
            }
        }
        r
    }
}

impl ops::Add for Coef {
    type Output = Coef;
    fn add(self, other: Coef) -> Coef {
        &self + &other
    }
}

impl ops::Mul for Coef {
    type Output = Coef;
    fn mul(self, other: Coef) -> Coef {
        &self * &other
    }
}

impl ops::Neg for Coef {
    type Output = Coef;
    fn neg(mut self) -> Coef {
        for c in self.monomials.values_mut() {
            *c = -*c;
        }
        self
    }
}

impl fmt::Display for Coef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.monomials.is_empty() {
            return f.write_str("0");
        }
        for (i, (powers, &c)) in self.monomials.iter().enumerate() {
            if i != 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{:?}", c)?;
            for (p, &n) in Param::ALL.iter().zip(powers) {
                match n {
                    0 => {}
                    1 => write!(f, "*{}", p.symbol())?,
                    n => write!(f, "*{}^{}", p.symbol(), n)?,
                }
            }
        }
        Ok(())
    }
}

/// One `coefficient × product` term.  An empty product is the identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub coef: Coef,
    pub prod: Vec<Primitive>,
}

impl Term {
    /// Angular momentum of the product, or `Err(max)` if more than one
    /// factor carries angular momentum.
    pub fn am(&self) -> ::std::result::Result<i32, i32> {
        let ls: Vec<i32> = self.prod.iter()
            .map(|x| x.am())
            .filter(|&l| l != 0)
            .collect();
        match ls.len() {
            0 => Ok(0),
            1 => Ok(ls[0]),
            _ => Err(ls.iter().cloned().max().unwrap_or(0)),
        }
    }

    pub fn parity(&self) -> i32 {
        self.prod.iter().map(|x| x.parity()).sum::<i32>() % 2
    }

    pub fn is_tame(&self) -> bool {
        !self.prod.iter().any(|x| x.is_wild())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.coef.monomials.len() > 1 {
            write!(f, "({})", self.coef)?;
        } else {
            write!(f, "{}", self.coef)?;
        }
        for x in &self.prod {
            write!(f, "*{}", x)?;
        }
        Ok(())
    }
}

/// Sum of terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpSum {
    terms: Vec<Term>,
}

impl OpSum {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Append a term.  Terms with a zero coefficient are dropped.
    pub fn push<C: Into<Coef>>(&mut self, coef: C, prod: Vec<Primitive>) {
        let coef = coef.into();
        if !coef.is_zero() {
            self.terms.push(Term { coef, prod });
        }
    }

    pub fn with<C: Into<Coef>>(mut self, coef: C, prod: Vec<Primitive>) -> Self {
        self.push(coef, prod);
        self
    }

    /// Append `c` times every term of `other`.
    pub fn add_scaled(&mut self, c: f64, other: &OpSum) {
        let c = Coef::constant(c);
        for term in &other.terms {
            self.push(&c * &term.coef, term.prod.clone());
        }
    }

    /// Angular momentum carried by the operator.  If it is not well
    /// defined, the negative of the largest angular momentum of any factor.
    pub fn am(&self) -> i32 {
        let mut common = None;
        let mut well_defined = true;
        let mut max = 0;
        for term in &self.terms {
            match term.am() {
                Ok(l) => {
                    max = max.max(l);
                    match common {
                        None => common = Some(l),
                        Some(c) if c == l => {}
                        Some(_) => well_defined = false,
                    }
                }
                Err(l) => {
                    max = max.max(l);
                    well_defined = false;
                }
            }
        }
        if well_defined {
            common.unwrap_or(0)
        } else {
            -max
        }
    }

    /// `0` or `1` if every term has the same parity, `−1` otherwise.
    pub fn parity(&self) -> i32 {
        let mut r = None;
        for term in &self.terms {
            let p = term.parity();
            match r {
                None => r = Some(p),
                Some(q) if q == p => {}
                Some(_) => return -1,
            }
        }
        r.unwrap_or(0)
    }

    /// Whether the operator can be represented one `L` at a time.  The
    /// empty operator is tame.
    pub fn is_tame(&self) -> bool {
        self.terms.iter().all(|t| t.is_tame())
    }

    /// Parse `coef*Sym*Sym + coef*Sym - ...`.  Coefficients are built from
    /// numbers, the four state labels, `+ - * / ^` and parentheses.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parser = Parser::new(s);
        let r = parser.sum()?;
        match parser.peek()? {
            None => Ok(r),
            Some(tok) => Err(parser.unexpected(tok)),
        }
    }
}

impl ops::Add for OpSum {
    type Output = OpSum;
    fn add(mut self, other: OpSum) -> OpSum {
        self.terms.extend(other.terms);
        self
    }
}

impl fmt::Display for OpSum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i != 0 {
                f.write_str(" + ")?;
            }
            term.fmt(f)?;
        }
        Ok(())
    }
}

impl str::FromStr for OpSum {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        OpSum::parse(s)
    }
}

/// Serialized as its text form.
impl Serialize for OpSum {
    fn serialize<S: Serializer>(&self, s: S) -> ::std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OpSum {
    fn deserialize<D: Deserializer<'de>>(d: D) -> ::std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        OpSum::parse(&s).map_err(de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Num(f64),
    Sym(char),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn undefined(&self, what: &str) -> Error {
        Error::UndefinedOperator(format!("{} in {:?}", what, self.input))
    }

    fn unexpected(&self, tok: Token) -> Error {
        self.undefined(&format!("unexpected {:?}", tok))
    }

    fn lex(&self) -> Result<Option<(Token<'a>, usize)>> {
        let rest = &self.input[self.pos ..];
        let caps = match re!(
            r"^\s*(?:([A-Za-z_]\w*)|((?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)|(\S))"
        ).captures(rest) {
            None => return Ok(None),
            Some(caps) => caps,
        };
        let end = self.pos + caps.get(0).map(|m| m.end()).unwrap_or(0);
        let tok = if let Some(m) = caps.get(1) {
            Token::Ident(&self.input[self.pos + m.start() .. self.pos + m.end()])
        } else if let Some(m) = caps.get(2) {
            Token::Num(m.as_str().parse()
                       .map_err(|_| self.undefined(m.as_str()))?)
        } else if let Some(m) = caps.get(3) {
            Token::Sym(m.as_str().chars().next().unwrap_or(' '))
        } else {
            return Ok(None);
        };
        Ok(Some((tok, end)))
    }

    fn peek(&self) -> Result<Option<Token<'a>>> {
        Ok(self.lex()?.map(|(tok, _)| tok))
    }

    fn next(&mut self) -> Result<Option<Token<'a>>> {
        Ok(match self.lex()? {
            None => None,
            Some((tok, end)) => {
                self.pos = end;
                Some(tok)
            }
        })
    }

    fn eat(&mut self, c: char) -> Result<bool> {
        if self.peek()? == Some(Token::Sym(c)) {
            self.pos = self.lex()?.map(|(_, end)| end).unwrap_or(self.pos);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn sign(&mut self) -> Result<f64> {
        let mut sign = 1.0;
        loop {
            if self.eat('-')? {
                sign = -sign;
            } else if !self.eat('+')? {
                return Ok(sign);
            }
        }
    }

    fn sum(&mut self) -> Result<OpSum> {
        let mut r = OpSum::new();
        let mut sign = self.sign()?;
        loop {
            let (coef, prod) = self.term(true)?;
            r.push(&Coef::constant(sign) * &coef, prod);
            if self.eat('+')? {
                sign = 1.0;
            } else if self.eat('-')? {
                sign = -1.0;
            } else {
                return Ok(r);
            }
        }
    }

    fn poly(&mut self) -> Result<Coef> {
        let mut r = Coef::zero();
        let mut sign = self.sign()?;
        loop {
            let (coef, _) = self.term(false)?;
            r = &r + &(&Coef::constant(sign) * &coef);
            if self.eat('+')? {
                sign = 1.0;
            } else if self.eat('-')? {
                sign = -1.0;
            } else {
                return Ok(r);
            }
        }
    }

    fn term(&mut self, allow_ops: bool) -> Result<(Coef, Vec<Primitive>)> {
        let mut coef = Coef::constant(1.0);
        let mut prod = Vec::new();
        let mut divide = false;
        loop {
            let sign = self.sign()?;
            match self.factor(allow_ops)? {
                Ok(c) => {
                    let c = &Coef::constant(sign) * &c;
                    if divide {
                        match c.as_const() {
                            Some(d) if d != 0.0 => {
                                coef = &coef * &Coef::constant(1.0 / d);
                            }
                            _ => return Err(self.undefined("division by a non-constant")),
                        }
                    } else {
                        coef = &coef * &c;
                    }
                }
                Err(x) => {
                    if divide {
                        return Err(self.undefined("division by an operator"));
                    }
                    coef = &coef * &Coef::constant(sign);
                    prod.push(x);
                }
            }
            if self.eat('*')? {
                divide = false;
            } else if self.eat('/')? {
                divide = true;
            } else {
                return Ok((coef, prod));
            }
        }
    }

    /// A scalar factor (`Ok`) or an operator symbol (`Err`).
    fn factor(&mut self, allow_ops: bool)
              -> Result<::std::result::Result<Coef, Primitive>> {
        let base = match self.next()? {
            Some(Token::Num(x)) => Coef::constant(x),
            Some(Token::Sym('(')) => {
                let c = self.poly()?;
                if !self.eat(')')? {
                    return Err(self.undefined("unbalanced parenthesis"));
                }
                c
            }
            Some(Token::Ident(name)) => {
                match Param::ALL.iter().find(|p| p.symbol() == name) {
                    Some(&p) => Coef::param(p),
                    None if allow_ops => return Ok(Err(name.parse()?)),
                    None => return Err(Error::UndefinedOperator(name.to_owned())),
                }
            }
            Some(tok) => return Err(self.unexpected(tok)),
            None => return Err(self.undefined("unexpected end")),
        };
        if self.eat('^')? {
            match self.next()? {
                Some(Token::Num(n)) if n >= 0.0 && n.fract() == 0.0 => {
                    Ok(Ok(base.pow(n as u32)))
                }
                _ => Err(self.undefined("exponent must be a natural number")),
            }
        } else {
            Ok(Ok(base))
        }
    }
}
